use orderwatch_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let loaded = AppConfig::load(LoadOptions::default()).map_err(|error| error.to_string());
    let report = build_report(loaded);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(loaded: Result<AppConfig, String>) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_slack_tokens(&config));
            checks.push(check_commerce_backend(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error,
            });
            for name in ["slack_token_readiness", "commerce_backend"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_slack_tokens(config: &AppConfig) -> DoctorCheck {
    let scope = match &config.slack.channel_id {
        Some(channel_id) => format!("listening on channel {channel_id} only"),
        None => "listening on every channel the bot is in".to_string(),
    };
    DoctorCheck {
        name: "slack_token_readiness",
        status: CheckStatus::Pass,
        details: format!("app and bot token formats validated; {scope}"),
    }
}

// No request is sent; only the endpoint that lookups would use is reported.
fn check_commerce_backend(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "commerce_backend",
        status: CheckStatus::Pass,
        details: format!("orders will be queried at {}", config.commerce.graphql_endpoint()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use orderwatch_core::config::AppConfig;

    use super::{build_report, render_human, CheckStatus};

    #[test]
    fn failed_config_skips_dependent_checks() {
        let report = build_report(Err("slack.app_token is required".to_string()));

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert!(report.checks[1..].iter().all(|check| check.status == CheckStatus::Skipped));
        assert!(render_human(&report).contains("- [fail] config_validation: slack.app_token"));
    }

    #[test]
    fn valid_config_reports_channel_lock_and_endpoint() {
        let mut config = AppConfig::default();
        config.slack.channel_id = Some("C-ORDERS".to_string());
        config.commerce.shop_domain = "example-store.myshopify.com".to_string();

        let report = build_report(Ok(config));

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert!(report.checks[1].details.contains("C-ORDERS"));
        assert!(report.checks[2]
            .details
            .contains("https://example-store.myshopify.com/admin/api/2024-10/graphql.json"));
    }
}
