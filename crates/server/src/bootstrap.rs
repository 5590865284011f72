use std::sync::Arc;

use orderwatch_commerce::CommerceClient;
use orderwatch_core::config::{AppConfig, ConfigError};
use orderwatch_core::NarrativeEngine;
use orderwatch_slack::{
    events::{EventDispatcher, OrderMessageHandler},
    pipeline::OrderPipeline,
    socket::{ReconnectPolicy, SlackSocketTransport, SocketModeRunner},
    web::SlackWebClient,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Wires commerce lookup, reply posting and the socket transport from an
/// already-validated config.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        shop_domain = %config.commerce.shop_domain,
        "starting application bootstrap"
    );

    let commerce = CommerceClient::from_config(&config.commerce);
    let web = SlackWebClient::from_config(&config.slack);
    let pipeline =
        OrderPipeline::new(commerce, NarrativeEngine::new(config.commerce.shop_domain.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(OrderMessageHandler::new(
        pipeline,
        web.clone(),
        config.slack.channel_id.clone(),
    ));

    let transport = SlackSocketTransport::new(web, config.slack.app_token.clone());
    let slack_runner =
        SocketModeRunner::new(Arc::new(transport), dispatcher, ReconnectPolicy::default());

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        channel_lock = config.slack.channel_id.as_deref().unwrap_or("none"),
        "order lookup pipeline wired"
    );

    Ok(Application { config, slack_runner })
}

#[cfg(test)]
mod tests {
    use orderwatch_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?).await
    }

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            slack_app_token: Some("xapp-test".to_string()),
            slack_bot_token: Some("xoxb-test".to_string()),
            commerce_shop_domain: Some("example-store.myshopify.com".to_string()),
            commerce_access_token: Some("shpat_test".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_required_slack_tokens() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("invalid-token".to_string()),
                ..valid_overrides()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.app_token"));
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_commerce_credentials() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                commerce_access_token: Some("   ".to_string()),
                ..valid_overrides()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("commerce.access_token"));
    }

    #[tokio::test]
    async fn bootstrap_registers_the_order_message_handler() {
        let app = bootstrap(LoadOptions { overrides: valid_overrides(), ..LoadOptions::default() })
            .await
            .expect("bootstrap should succeed with valid overrides");

        assert_eq!(app.slack_runner.dispatcher().handler_count(), 1);
        assert_eq!(app.config.commerce.shop_domain, "example-store.myshopify.com");
    }
}
