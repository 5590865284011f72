use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_VERSION: &str = "2024-10";
pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub commerce: CommerceConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
    /// When set, messages from every other channel are ignored.
    pub channel_id: Option<String>,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct CommerceConfig {
    pub shop_domain: String,
    pub access_token: SecretString,
    pub api_version: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub slack_app_token: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_channel_id: Option<String>,
    pub commerce_shop_domain: Option<String>,
    pub commerce_access_token: Option<String>,
    pub commerce_api_version: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                app_token: String::new().into(),
                bot_token: String::new().into(),
                channel_id: None,
                api_base_url: DEFAULT_SLACK_API_BASE_URL.to_string(),
            },
            commerce: CommerceConfig {
                shop_domain: String::new(),
                access_token: String::new().into(),
                api_version: DEFAULT_API_VERSION.to_string(),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), health_check_port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CommerceConfig {
    pub fn graphql_endpoint(&self) -> String {
        format!("https://{}/admin/api/{}/graphql.json", self.shop_domain, self.api_version)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("orderwatch.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(slack_app_token_value) = slack.app_token {
                self.slack.app_token = secret_value(slack_app_token_value);
            }
            if let Some(slack_bot_token_value) = slack.bot_token {
                self.slack.bot_token = secret_value(slack_bot_token_value);
            }
            if let Some(channel_id) = slack.channel_id {
                self.slack.channel_id = Some(channel_id);
            }
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
        }

        if let Some(commerce) = patch.commerce {
            if let Some(shop_domain) = commerce.shop_domain {
                self.commerce.shop_domain = shop_domain;
            }
            if let Some(access_token_value) = commerce.access_token {
                self.commerce.access_token = secret_value(access_token_value);
            }
            if let Some(api_version) = commerce.api_version {
                self.commerce.api_version = api_version;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ORDERWATCH_SLACK_APP_TOKEN") {
            self.slack.app_token = secret_value(value);
        }
        if let Some(value) = read_env("ORDERWATCH_SLACK_BOT_TOKEN") {
            self.slack.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("ORDERWATCH_SLACK_CHANNEL_ID") {
            self.slack.channel_id = Some(value);
        }
        if let Some(value) = read_env("ORDERWATCH_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }

        if let Some(value) = read_env("ORDERWATCH_COMMERCE_SHOP_DOMAIN") {
            self.commerce.shop_domain = value;
        }
        if let Some(value) = read_env("ORDERWATCH_COMMERCE_ACCESS_TOKEN") {
            self.commerce.access_token = secret_value(value);
        }
        if let Some(value) = read_env("ORDERWATCH_COMMERCE_API_VERSION") {
            self.commerce.api_version = value;
        }

        if let Some(value) = read_env("ORDERWATCH_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ORDERWATCH_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("ORDERWATCH_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("ORDERWATCH_LOGGING_LEVEL").or_else(|| read_env("ORDERWATCH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ORDERWATCH_LOGGING_FORMAT").or_else(|| read_env("ORDERWATCH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(slack_app_token) = overrides.slack_app_token {
            self.slack.app_token = secret_value(slack_app_token);
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = secret_value(slack_bot_token);
        }
        if let Some(channel_id) = overrides.slack_channel_id {
            self.slack.channel_id = Some(channel_id);
        }
        if let Some(shop_domain) = overrides.commerce_shop_domain {
            self.commerce.shop_domain = shop_domain;
        }
        if let Some(access_token) = overrides.commerce_access_token {
            self.commerce.access_token = secret_value(access_token);
        }
        if let Some(api_version) = overrides.commerce_api_version {
            self.commerce.api_version = api_version;
        }
    }

    // An empty channel lock means "all channels"; a pasted URL is reduced to its host.
    fn normalize(&mut self) {
        self.slack.channel_id = self
            .slack
            .channel_id
            .take()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let domain = self.commerce.shop_domain.trim();
        let domain = domain
            .strip_prefix("https://")
            .or_else(|| domain.strip_prefix("http://"))
            .unwrap_or(domain);
        self.commerce.shop_domain = domain.trim_end_matches('/').to_string();
        self.commerce.api_version = self.commerce.api_version.trim().to_string();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slack(&self.slack)?;
        validate_commerce(&self.commerce)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("orderwatch.toml"), PathBuf::from("config/orderwatch.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let app_token = slack.app_token.expose_secret();
    if app_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.app_token is required. Get it from https://api.slack.com/apps > Your App > Basic Information > App-Level Tokens".to_string()
        ));
    }
    if !app_token.starts_with("xapp-") {
        let hint = if app_token.starts_with("xoxb-") {
            " (hint: you may have used the bot token instead of the app token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.app_token must start with `xapp-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "slack.bot_token is required. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: you may have used the app token instead of the bot token)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "slack.bot_token must start with `xoxb-`{hint}. Get it from https://api.slack.com/apps"
        )));
    }

    let base_url = slack.api_base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "slack.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_commerce(commerce: &CommerceConfig) -> Result<(), ConfigError> {
    if commerce.shop_domain.is_empty() {
        return Err(ConfigError::Validation(
            "commerce.shop_domain is required (for example `my-store.myshopify.com`)".to_string(),
        ));
    }
    if commerce.shop_domain.contains('/') || commerce.shop_domain.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "commerce.shop_domain must be a bare host name without path segments".to_string(),
        ));
    }

    if commerce.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "commerce.access_token is required. Create an Admin API access token for a custom app with `read_orders` scope".to_string(),
        ));
    }

    if commerce.api_version.is_empty() {
        return Err(ConfigError::Validation("commerce.api_version must not be empty".to_string()));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    commerce: Option<CommercePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
    channel_id: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CommercePatch {
    shop_domain: Option<String>,
    access_token: Option<String>,
    api_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const BASE_VARS: &[&str] = &[
        "ORDERWATCH_SLACK_APP_TOKEN",
        "ORDERWATCH_SLACK_BOT_TOKEN",
        "ORDERWATCH_COMMERCE_SHOP_DOMAIN",
        "ORDERWATCH_COMMERCE_ACCESS_TOKEN",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_base_vars() {
        env::set_var("ORDERWATCH_SLACK_APP_TOKEN", "xapp-test");
        env::set_var("ORDERWATCH_SLACK_BOT_TOKEN", "xoxb-test");
        env::set_var("ORDERWATCH_COMMERCE_SHOP_DOMAIN", "example-store.myshopify.com");
        env::set_var("ORDERWATCH_COMMERCE_ACCESS_TOKEN", "shpat_test");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SHOP_TOKEN", "shpat_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orderwatch.toml");
            fs::write(
                &path,
                r#"
[slack]
app_token = "xapp-file"
bot_token = "xoxb-file"

[commerce]
shop_domain = "file-store.myshopify.com"
access_token = "${TEST_SHOP_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.commerce.access_token.expose_secret() == "shpat_from_env",
                "access token should be interpolated from environment",
            )?;
            ensure(
                config.commerce.api_version == super::DEFAULT_API_VERSION,
                "api version should fall back to the default",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_SHOP_TOKEN"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_MISSING_TOKEN"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("orderwatch.toml");
        fs::write(&path, "[commerce]\naccess_token = \"${TEST_MISSING_TOKEN}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_MISSING_TOKEN"),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();
        env::set_var("ORDERWATCH_LOG_LEVEL", "warn");
        env::set_var("ORDERWATCH_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(BASE_VARS);
        clear_vars(&["ORDERWATCH_LOG_LEVEL", "ORDERWATCH_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();
        env::set_var("ORDERWATCH_SLACK_CHANNEL_ID", "C-FROM-ENV");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orderwatch.toml");
            fs::write(
                &path,
                r#"
[slack]
channel_id = "C-FROM-FILE"

[commerce]
api_version = "2024-07"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    commerce_api_version: Some("2025-01".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.commerce.api_version == "2025-01", "override api version should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.slack.channel_id.as_deref() == Some("C-FROM-ENV"),
                "env channel lock should win over file",
            )?;
            Ok(())
        })();

        clear_vars(BASE_VARS);
        clear_vars(&["ORDERWATCH_SLACK_CHANNEL_ID"]);
        result
    }

    #[test]
    fn shop_domain_is_reduced_to_host_and_blank_channel_lock_is_dropped() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    commerce_shop_domain: Some(" https://pasted.myshopify.com/ ".to_string()),
                    slack_channel_id: Some("   ".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.commerce.shop_domain == "pasted.myshopify.com",
                "scheme and trailing slash should be stripped",
            )?;
            ensure(config.slack.channel_id.is_none(), "blank channel lock means all channels")?;
            ensure(
                config.commerce.graphql_endpoint()
                    == "https://pasted.myshopify.com/admin/api/2024-10/graphql.json",
                "graphql endpoint should combine domain and version",
            )?;
            Ok(())
        })();

        clear_vars(BASE_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();
        env::set_var("ORDERWATCH_SLACK_APP_TOKEN", "bad");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("slack.app_token")
            );
            ensure(has_message, "validation failure should mention slack.app_token")
        })();

        clear_vars(BASE_VARS);
        result
    }

    #[test]
    fn missing_commerce_domain_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();
        env::remove_var("ORDERWATCH_COMMERCE_SHOP_DOMAIN");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("commerce.shop_domain")),
                "validation failure should mention commerce.shop_domain",
            )
        })();

        clear_vars(BASE_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_base_vars();
        env::set_var("ORDERWATCH_COMMERCE_ACCESS_TOKEN", "shpat_secret_value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("shpat_secret_value"),
                "debug output should not contain the commerce token",
            )?;
            ensure(!debug.contains("xoxb-test"), "debug output should not contain bot token")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(BASE_VARS);
        result
    }
}
