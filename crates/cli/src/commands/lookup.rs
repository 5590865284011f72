use orderwatch_commerce::CommerceClient;
use orderwatch_core::config::{AppConfig, LoadOptions};
use orderwatch_core::{InterfaceError, NarrativeEngine, OrderLookup};
use orderwatch_slack::events::extract_order_names;
use orderwatch_slack::pipeline::{LookupOutcome, OrderPipeline};
use serde_json::json;
use uuid::Uuid;

use crate::commands::CommandResult;

pub fn run(order_name: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "lookup",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let engine = NarrativeEngine::new(config.commerce.shop_domain.clone());
    run_with_lookup(CommerceClient::from_config(&config.commerce), engine, order_name, json_output)
}

/// Runs one lookup through the same pipeline the Slack handler uses, without
/// posting anything.
pub fn run_with_lookup<L>(
    lookup: L,
    engine: NarrativeEngine,
    order_name: &str,
    json_output: bool,
) -> CommandResult
where
    L: OrderLookup,
{
    let order_name = order_name.trim();
    if extract_order_names(order_name) != [order_name] {
        return CommandResult::failure(
            "lookup",
            "invalid_order_name",
            format!("`{order_name}` is not an order name like #S1234 or #S12345"),
            2,
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "lookup",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let pipeline = OrderPipeline::new(lookup, engine);
    match runtime.block_on(pipeline.run(order_name)) {
        Ok(outcome) if json_output => CommandResult { exit_code: 0, output: render_json(&outcome) },
        Ok(outcome) => CommandResult { exit_code: 0, output: render_human(order_name, &outcome) },
        Err(error) => {
            let correlation_id = Uuid::new_v4().to_string();
            let interface = InterfaceError::lookup_failed(order_name, &error, &correlation_id);
            CommandResult::failure_with_correlation(
                "lookup",
                error.kind(),
                interface.to_string(),
                4,
                Some(correlation_id),
            )
        }
    }
}

fn render_json(outcome: &LookupOutcome) -> String {
    let payload = match outcome {
        LookupOutcome::Found { analysis, message } => json!({
            "command": "lookup",
            "status": "ok",
            "found": true,
            "analysis": analysis,
            "message": message,
        }),
        LookupOutcome::NotFound { message } => json!({
            "command": "lookup",
            "status": "ok",
            "found": false,
            "message": message,
        }),
    };
    serde_json::to_string_pretty(&payload)
        .unwrap_or_else(|error| serialization_failure(&error.to_string()))
}

fn serialization_failure(message: &str) -> String {
    json!({
        "command": "lookup",
        "status": "error",
        "error_class": "serialization",
        "message": message,
    })
    .to_string()
}

fn render_human(order_name: &str, outcome: &LookupOutcome) -> String {
    let LookupOutcome::Found { analysis, .. } = outcome else {
        return format!("order {order_name} not found");
    };

    let mut lines = vec![analysis.header.clone()];
    lines.extend(analysis.narrative.iter().map(|line| format!("  {line}")));
    if !analysis.details.is_empty() {
        lines.push(String::new());
        lines.extend(
            analysis.details.iter().map(|entry| format!("- {}: {}", entry.label, entry.value)),
        );
    }
    for link in &analysis.footer_links {
        lines.push(format!("{}: {}", link.label, link.url));
    }
    lines.join("\n")
}
