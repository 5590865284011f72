use async_trait::async_trait;
use orderwatch_core::config::SlackConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::blocks::MessageTemplate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack api request failed: {0}")]
    Request(String),
    #[error("slack api returned HTTP {0}")]
    Http(u16),
    #[error("slack api error: {0}")]
    Api(String),
    #[error("slack api response could not be decoded: {0}")]
    Decode(String),
}

/// Posts a message as a threaded reply.
#[async_trait]
pub trait ReplyPoster: Send + Sync {
    async fn post_reply(
        &self,
        channel_id: &str,
        thread_ts: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    url: Option<String>,
}

/// Minimal Slack Web API client: `chat.postMessage` and `apps.connections.open`.
#[derive(Clone)]
pub struct SlackWebClient {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl SlackWebClient {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client: Client::new(), base_url, bot_token }
    }

    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.bot_token.clone())
    }

    /// Requests a Socket Mode WebSocket URL using the app-level token.
    pub async fn open_socket_url(&self, app_token: &SecretString) -> Result<String, SlackApiError> {
        let response = self
            .client
            .post(format!("{}/apps.connections.open", self.base_url))
            .bearer_auth(app_token.expose_secret())
            .send()
            .await
            .map_err(|error| SlackApiError::Request(error.to_string()))?;

        let payload = read_api_response(response).await?;
        payload
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                SlackApiError::Decode("apps.connections.open returned no url".to_owned())
            })
    }

    async fn post_message(
        &self,
        channel_id: &str,
        thread_ts: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        let body = json!({
            "channel": channel_id,
            "thread_ts": thread_ts,
            "text": message.fallback_text,
            "blocks": message.blocks,
        });

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| SlackApiError::Request(error.to_string()))?;

        read_api_response(response).await?;
        debug!(
            event_name = "egress.slack.reply_posted",
            channel_id,
            thread_id = thread_ts,
            "posted threaded reply"
        );
        Ok(())
    }
}

async fn read_api_response(response: reqwest::Response) -> Result<ApiResponse, SlackApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SlackApiError::Http(status.as_u16()));
    }

    let payload: ApiResponse =
        response.json().await.map_err(|error| SlackApiError::Decode(error.to_string()))?;
    if !payload.ok {
        return Err(SlackApiError::Api(payload.error.unwrap_or_else(|| "unknown_error".to_owned())));
    }
    Ok(payload)
}

#[async_trait]
impl ReplyPoster for SlackWebClient {
    async fn post_reply(
        &self,
        channel_id: &str,
        thread_ts: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        self.post_message(channel_id, thread_ts, message).await
    }
}
