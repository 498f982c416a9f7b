use kronos_core::config::{AppConfig, LoadOptions};
use kronos_db::{connect_with_config, migrations};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CHECKS_FAILED};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
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

pub fn run(json_output: bool) -> CommandResult {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| error.to_string());
    let report = build_report(config);
    let exit_code = if report.overall_status == CheckStatus::Fail { EXIT_CHECKS_FAILED } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult::plain(exit_code, output)
}

fn build_report(config: Result<AppConfig, String>) -> DoctorReport {
    let checks = match config {
        Ok(config) => vec![
            DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            },
            check_slack_readiness(&config),
            check_database(&config),
        ],
        Err(error) => {
            let skipped = |name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            };
            vec![
                DoctorCheck { name: "config_validation", status: CheckStatus::Fail, details: error },
                skipped("slack_readiness"),
                skipped("database"),
            ]
        }
    };

    let failed = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Token format is enforced by config validation; this reports what the
/// server will do with it.
fn check_slack_readiness(config: &AppConfig) -> DoctorCheck {
    let production = config.app.mode.is_production();
    let signature = if config.slack.signing_secret.is_some() {
        "request signatures verified"
    } else {
        "request signatures not verified (slack.signing_secret unset)"
    };

    match (config.has_bot_token(), production) {
        (true, true) => DoctorCheck {
            name: "slack_readiness",
            status: CheckStatus::Pass,
            details: format!("prod mode posts acknowledgements via web api; {signature}"),
        },
        (true, false) => DoctorCheck {
            name: "slack_readiness",
            status: CheckStatus::Pass,
            details: format!("dev mode: acknowledgements disabled, menus via web api; {signature}"),
        },
        (false, _) => DoctorCheck {
            name: "slack_readiness",
            status: CheckStatus::Warn,
            details: format!("no bot token: slack calls are skipped (noop messenger); {signature}"),
        },
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let ready = migrations::schema_ready(&pool).await;
        pool.close().await;
        ready.map_err(|error| format!("schema query failed: {error}"))
    });

    match result {
        Ok(true) => DoctorCheck {
            name: "database",
            status: CheckStatus::Pass,
            details: format!(
                "connected using `{}`; slack_timestamp table present",
                config.database.url
            ),
        },
        Ok(false) => DoctorCheck {
            name: "database",
            status: CheckStatus::Warn,
            details: format!(
                "connected using `{}` but slack_timestamp is missing; run `kronos migrate`",
                config.database.url
            ),
        },
        Err(error) => DoctorCheck { name: "database", status: CheckStatus::Fail, details: error },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{build_report, render_human, CheckStatus};

    #[test]
    fn config_failure_skips_dependent_checks() {
        let report = build_report(Err("database.url must be a sqlite URL".to_string()));

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
        assert!(report.checks[1..].iter().all(|check| check.status == CheckStatus::Skipped));
        assert!(render_human(&report).contains("- [skip] database:"));
    }
}
