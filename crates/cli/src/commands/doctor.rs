use std::sync::Arc;

use orderly_core::{fixtures, EngineConfig, Field, FieldMapper, LoadOptions};
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
    let report = build_report();

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

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_reference_fixtures());
            checks.push(check_resolver_probe(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "reference_fixtures",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "resolver_probe",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
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

fn check_reference_fixtures() -> DoctorCheck {
    let index = fixtures::reference_index();
    if index.is_usable() {
        DoctorCheck {
            name: "reference_fixtures",
            status: CheckStatus::Pass,
            details: format!(
                "seed tables loaded: {} clients, {} materials, {} payment terms, {} payment \
                 methods, {} plants",
                fixtures::CLIENTS.len(),
                fixtures::MATERIALS.len(),
                fixtures::PAYMENT_TERMS.len(),
                fixtures::PAYMENT_METHODS.len(),
                fixtures::PLANTS.len(),
            ),
        }
    } else {
        DoctorCheck {
            name: "reference_fixtures",
            status: CheckStatus::Fail,
            details: "seed reference tables are empty".to_string(),
        }
    }
}

/// Runs one known value through the resolver as an end-to-end sanity check.
fn check_resolver_probe(config: &EngineConfig) -> DoctorCheck {
    let mapper =
        FieldMapper::new(Arc::new(fixtures::reference_index()), config.matching.clone());
    let mut draft = orderly_core::DraftOrder::default();
    draft.set(Field::PaymentMethod, Some("boleto".to_string()));
    let pass = mapper.map(&draft, "");

    if pass.draft.get(Field::PaymentMethod) == Some("D") && pass.issues.is_empty() {
        DoctorCheck {
            name: "resolver_probe",
            status: CheckStatus::Pass,
            details: "'boleto' resolved to payment method code D".to_string(),
        }
    } else {
        DoctorCheck {
            name: "resolver_probe",
            status: CheckStatus::Fail,
            details: format!(
                "'boleto' resolved to {:?} with issues {:?}",
                pass.draft.get(Field::PaymentMethod),
                pass.issues
            ),
        }
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
