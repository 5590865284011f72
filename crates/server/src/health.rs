use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use orderwatch_core::config::CommerceConfig;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    shop_domain: String,
    api_version: String,
}

impl HealthState {
    pub fn from_config(commerce: &CommerceConfig) -> Self {
        Self {
            shop_domain: commerce.shop_domain.clone(),
            api_version: commerce.api_version.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub commerce: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let commerce = commerce_check(&state);
    let ready = commerce.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "orderwatch-server runtime initialized".to_string(),
        },
        commerce,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

// Configuration only; the backend is not contacted.
fn commerce_check(state: &HealthState) -> HealthCheck {
    if state.shop_domain.is_empty() {
        return HealthCheck {
            status: "degraded",
            detail: "commerce shop domain is not configured".to_string(),
        };
    }
    HealthCheck {
        status: "ready",
        detail: format!("{} (admin api {})", state.shop_domain, state.api_version),
    }
}
