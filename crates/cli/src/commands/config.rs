use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use orderwatch_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    render(&config, detect_config_path().as_deref())
}

/// One line per effective setting with its source; secrets are redacted.
pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);

    let entries = [
        ("slack.app_token", redact_token(config.slack.app_token.expose_secret())),
        ("slack.bot_token", redact_token(config.slack.bot_token.expose_secret())),
        (
            "slack.channel_id",
            config.slack.channel_id.clone().unwrap_or_else(|| "<any channel>".to_string()),
        ),
        ("slack.api_base_url", config.slack.api_base_url.clone()),
        ("commerce.shop_domain", config.commerce.shop_domain.clone()),
        ("commerce.access_token", redact_secret(config.commerce.access_token.expose_secret())),
        ("commerce.api_version", config.commerce.api_version.clone()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.health_check_port", config.server.health_check_port.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value) in entries {
        let source = field_source(key, config_file_doc.as_ref(), config_file_path);
        lines.push(render_line(key, &value, source));
    }
    lines.join("\n")
}

/// `logging.level` -> `ORDERWATCH_LOGGING_LEVEL`, plus the short `LOG_*` aliases.
fn env_keys(key_path: &str) -> Vec<String> {
    let primary = format!("ORDERWATCH_{}", key_path.replace('.', "_").to_ascii_uppercase());
    let mut keys = vec![primary];
    if let Some(field) = key_path.strip_prefix("logging.") {
        keys.push(format!("ORDERWATCH_LOG_{}", field.to_ascii_uppercase()));
    }
    keys
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("orderwatch.toml"), PathBuf::from("config/orderwatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys(key_path).into_iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
