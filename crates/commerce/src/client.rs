use async_trait::async_trait;
use orderwatch_core::config::CommerceConfig;
use orderwatch_core::{BackendError, OrderLookup, OrderRecord};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::query::order_by_name;
use crate::response::decode_order_response;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// GraphQL Admin API client. One request per lookup; no retries, no caching.
#[derive(Clone)]
pub struct CommerceClient {
    client: Client,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for CommerceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceClient").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl CommerceClient {
    pub fn from_config(config: &CommerceConfig) -> Self {
        Self::with_endpoint(config.graphql_endpoint(), config.access_token.clone())
    }

    pub fn with_endpoint(endpoint: impl Into<String>, access_token: SecretString) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into(), access_token }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch_order(&self, order_name: &str) -> Result<Option<OrderRecord>, BackendError> {
        let request = order_by_name(order_name);
        debug!(
            event_name = "commerce.lookup.request",
            order_name,
            endpoint = %self.endpoint,
            "querying commerce backend"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|error| BackendError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "commerce.lookup.http_error",
                order_name,
                status = %status,
                "commerce backend returned non-success status"
            );
            return Err(BackendError::Transport {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body: Value =
            response.json().await.map_err(|error| BackendError::Decode(error.to_string()))?;
        let record = decode_order_response(&body, order_name)?;

        debug!(
            event_name = "commerce.lookup.completed",
            order_name,
            found = record.is_some(),
            "commerce backend lookup completed"
        );
        Ok(record)
    }
}

#[async_trait]
impl OrderLookup for CommerceClient {
    async fn fetch(&self, order_name: &str) -> Result<Option<OrderRecord>, BackendError> {
        self.fetch_order(order_name).await
    }
}
