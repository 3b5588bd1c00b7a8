use serde::Serialize;

use cotibot_core::config::{AppConfig, LoadOptions};
use cotibot_db::{connect_with_settings, migrations, SqlQuoteLedger};

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
    message: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    command: &'static str,
    status: CheckStatus,
    checks: Vec<DoctorCheck>,
}

pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                message: error.to_string(),
            });
            checks.push(skipped("provider_credentials"));
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("quote_ledger"));
            return render(checks, json);
        }
    };

    checks.push(credentials_check(&config));

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(DoctorCheck {
                name: "db_connectivity",
                status: CheckStatus::Fail,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("quote_ledger"));
            return render(checks, json);
        }
    };

    runtime.block_on(async {
        match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                checks.push(DoctorCheck {
                    name: "db_connectivity",
                    status: CheckStatus::Pass,
                    message: format!("connected to {}", config.database.url),
                });

                match migrations::run_pending(&pool).await {
                    Ok(()) => match SqlQuoteLedger::new(pool.clone()).count().await {
                        Ok(count) => checks.push(DoctorCheck {
                            name: "quote_ledger",
                            status: CheckStatus::Pass,
                            message: format!("{count} quote records on file"),
                        }),
                        Err(error) => checks.push(DoctorCheck {
                            name: "quote_ledger",
                            status: CheckStatus::Fail,
                            message: error.to_string(),
                        }),
                    },
                    Err(error) => checks.push(DoctorCheck {
                        name: "quote_ledger",
                        status: CheckStatus::Fail,
                        message: format!("migrations failed: {error}"),
                    }),
                }

                pool.close().await;
            }
            Err(error) => {
                checks.push(DoctorCheck {
                    name: "db_connectivity",
                    status: CheckStatus::Fail,
                    message: error.to_string(),
                });
                checks.push(skipped("quote_ledger"));
            }
        }
    });

    render(checks, json)
}

/// Missing provider credentials are warnings, not failures: the bot runs
/// degraded (offline resolver, noop transport, manual pricing) without
/// them.
fn credentials_check(config: &AppConfig) -> DoctorCheck {
    let mut missing = Vec::new();
    if !config.whatsapp.is_configured() {
        missing.push("whatsapp");
    }
    if !config.geocoding.is_configured() {
        missing.push("mapbox");
    }
    if !config.routing.is_configured() {
        missing.push("openrouteservice");
    }

    if missing.is_empty() {
        DoctorCheck {
            name: "provider_credentials",
            status: CheckStatus::Pass,
            message: "all provider credentials configured".to_string(),
        }
    } else {
        DoctorCheck {
            name: "provider_credentials",
            status: CheckStatus::Warn,
            message: format!("running degraded without: {}", missing.join(", ")),
        }
    }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        message: "skipped due to earlier failure".to_string(),
    }
}

fn render(checks: Vec<DoctorCheck>, json: bool) -> String {
    let overall = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };

    let report = DoctorReport { command: "doctor", status: overall, checks };

    if json {
        return serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
    }

    let mut lines = vec![format!("doctor: {:?}", report.status).to_lowercase()];
    for check in &report.checks {
        lines.push(format!("  [{:?}] {} - {}", check.status, check.name, check.message).to_lowercase());
    }
    lines.join("\n")
}
