use std::env;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use orderwatch_cli::commands::{doctor, lookup};
use orderwatch_core::{
    AttributeKey, BackendError, CustomFields, NarrativeEngine, OrderLookup, OrderRecord,
};
use serde_json::Value;

struct StaticLookup(Result<Option<OrderRecord>, BackendError>);

#[async_trait]
impl OrderLookup for StaticLookup {
    async fn fetch(&self, _order_name: &str) -> Result<Option<OrderRecord>, BackendError> {
        self.0.clone()
    }
}

fn engine() -> NarrativeEngine {
    NarrativeEngine::new("example-store.myshopify.com")
}

fn unfulfilled_order() -> OrderRecord {
    OrderRecord {
        id: "gid://shopify/Order/5512".to_string(),
        name: "#S1234".to_string(),
        created_at: Utc::now() - Duration::weeks(3),
        customer_name: Some("Dana Reyes".to_string()),
        fulfillment_status: "UNFULFILLED".to_string(),
        fulfillments: Vec::new(),
        custom_fields: CustomFields::new()
            .with(AttributeKey::WeeksSinceOrder, "3")
            .with(AttributeKey::NeedsFollowUp, "needs_follow_up")
            .with(AttributeKey::FollowUpNotes, "call after 3pm"),
    }
}

#[test]
fn lookup_prints_narrative_details_and_admin_link() {
    let backend = StaticLookup(Ok(Some(unfulfilled_order())));
    let result = lookup::run_with_lookup(backend, engine(), "#S1234", false);

    assert_eq!(result.exit_code, 0);
    let lines: Vec<&str> = result.output.lines().collect();
    assert_eq!(lines[0], "Order #S1234 · Dana Reyes");
    assert_eq!(lines[1], "  Not yet fulfilled, 3 weeks since order");
    assert_eq!(lines[2], "  Needs follow-up");
    assert!(result.output.contains("call after 3pm"));
    assert!(result
        .output
        .ends_with("View in admin: https://example-store.myshopify.com/admin/orders/5512"));
}

#[test]
fn lookup_json_includes_analysis_and_blocks() {
    let backend = StaticLookup(Ok(Some(unfulfilled_order())));
    let result = lookup::run_with_lookup(backend, engine(), "#S1234", true);

    assert_eq!(result.exit_code, 0);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["found"], true);
    assert_eq!(payload["analysis"]["order_name"], "#S1234");
    assert_eq!(payload["message"]["blocks"][0]["type"], "header");
}

#[test]
fn lookup_reports_absent_order_as_success() {
    let result = lookup::run_with_lookup(StaticLookup(Ok(None)), engine(), "#S9999", true);

    assert_eq!(result.exit_code, 0);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["found"], false);
}

#[test]
fn lookup_backend_failure_carries_correlation_id() {
    let failure = BackendError::Transport { status: 503, body: "maintenance".to_string() };
    let result = lookup::run_with_lookup(StaticLookup(Err(failure)), engine(), "#S1234", false);

    assert_eq!(result.exit_code, 4);
    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "transport");
    assert!(payload["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn lookup_rejects_names_that_are_not_order_identifiers() {
    for name in ["S1234", "#s1234", "#S123", "#S1234 #S5678"] {
        let result = lookup::run_with_lookup(StaticLookup(Ok(None)), engine(), name, false);

        assert_eq!(result.exit_code, 2, "{name}");
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_order_name");
    }
}

#[test]
fn lookup_returns_config_failure_without_credentials() {
    with_env(&[], || {
        let result = lookup::run("#S1234", false);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "lookup");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_json_passes_with_valid_env() {
    with_env(
        &[
            ("ORDERWATCH_SLACK_APP_TOKEN", "xapp-test"),
            ("ORDERWATCH_SLACK_BOT_TOKEN", "xoxb-test"),
            ("ORDERWATCH_COMMERCE_SHOP_DOMAIN", "example-store.myshopify.com"),
            ("ORDERWATCH_COMMERCE_ACCESS_TOKEN", "shpat_test"),
        ],
        || {
            let payload = parse_payload(&doctor::run(true));
            assert_eq!(payload["overall_status"], "pass");
            assert_eq!(payload["checks"].as_array().map(Vec::len), Some(3));
        },
    );
}

#[test]
fn doctor_json_fails_without_tokens() {
    with_env(&[], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ORDERWATCH_SLACK_APP_TOKEN",
        "ORDERWATCH_SLACK_BOT_TOKEN",
        "ORDERWATCH_SLACK_CHANNEL_ID",
        "ORDERWATCH_SLACK_API_BASE_URL",
        "ORDERWATCH_COMMERCE_SHOP_DOMAIN",
        "ORDERWATCH_COMMERCE_ACCESS_TOKEN",
        "ORDERWATCH_COMMERCE_API_VERSION",
        "ORDERWATCH_SERVER_BIND_ADDRESS",
        "ORDERWATCH_SERVER_HEALTH_CHECK_PORT",
        "ORDERWATCH_LOGGING_LEVEL",
        "ORDERWATCH_LOGGING_FORMAT",
        "ORDERWATCH_LOG_LEVEL",
        "ORDERWATCH_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
