use std::env;
use std::sync::{Mutex, OnceLock};

use orderly_cli::commands::{cadence, config, doctor, resolve, simulate};
use serde_json::Value;

#[test]
fn doctor_passes_against_seed_reference_data() {
    with_env(&[], || {
        let output = doctor::run(false);
        assert!(output.contains("doctor: all readiness checks passed"), "got: {output}");
        assert!(output.contains("[ok] config_validation"));
        assert!(output.contains("[ok] reference_fixtures"));
        assert!(output.contains("[ok] resolver_probe"));
    });
}

#[test]
fn doctor_json_reports_overall_pass() {
    with_env(&[], || {
        let output = doctor::run(true);
        let report: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");
        assert_eq!(report["overall_status"], "pass");
        assert_eq!(report["checks"].as_array().map(Vec::len), Some(3));
    });
}

#[test]
fn doctor_fails_when_config_is_invalid() {
    with_env(&[("ORDERLY_MATCHING_FUZZY_FLOOR", "not-a-number")], || {
        let output = doctor::run(true);
        let report: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
    });
}

#[test]
fn config_attributes_defaults_without_overrides() {
    with_env(&[], || {
        let output = config::run();
        assert!(output.contains("effective config"), "got: {output}");
        assert!(output.contains("- matching.fuzzy_floor = 0.7 (source: default)"));
        assert!(output.contains("- validation.freight_exempt_incoterms = FOB,TPD (source: default)"));
        assert!(output.contains("- logging.level = info (source: default)"));
    });
}

#[test]
fn config_attributes_env_overrides_to_their_variable() {
    with_env(&[("ORDERLY_MATCHING_FUZZY_FLOOR", "0.8")], || {
        let output = config::run();
        assert!(
            output.contains("- matching.fuzzy_floor = 0.8 (source: env (ORDERLY_MATCHING_FUZZY_FLOOR))"),
            "got: {output}"
        );
        assert!(output.contains("- matching.tie_break_floor = 0.85 (source: default)"));
    });
}

#[test]
fn cadence_command_renders_canonical_entries() {
    let result = cadence::run(
        "40 toneladas em fevereiro; 20 toneladas em março",
        None,
        Some("10/01/2025"),
    );
    assert_eq!(result.exit_code, 0, "expected cadence parse success");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "cadence");
    assert_eq!(payload["status"], "ok");

    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("2 entries parsed:"), "got: {message}");
    assert!(message.contains("02.2025:40 ton"));
    assert!(message.contains("03.2025:20 ton"));
}

#[test]
fn cadence_command_rejects_unparseable_text() {
    let result = cadence::run("entrega quando der", None, None);
    assert_eq!(result.exit_code, 3, "expected cadence format failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "cadence");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "cadence_format");
}

#[test]
fn resolve_maps_a_payment_method_keyword_to_its_code() {
    let result = resolve::run("payment_method", "boleto");
    assert_eq!(result.exit_code, 0, "expected resolve success");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "resolve");
    assert_eq!(payload["status"], "ok");

    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("payment_method: \"boleto\" -> \"D\""), "got: {message}");
}

#[test]
fn resolve_rejects_an_unknown_field_name() {
    let result = resolve::run("delivery_window", "whatever");
    assert_eq!(result.exit_code, 3, "expected unknown field failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "resolve");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "unknown_field");

    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("payment_method"), "known fields should be listed: {message}");
}

#[test]
fn simulate_reaches_confirmation_with_the_stub_extractor() {
    with_env(&[], || {
        let result = simulate::run();
        assert_eq!(result.exit_code, 0, "expected scripted conversation success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "simulate");
        assert_eq!(payload["status"], "ok");

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("engine[NeedsInput]"), "freight should be requested: {message}");
        assert!(message.contains("engine[NeedsConfirmation]"), "got: {message}");
        assert!(message.contains("engine[Confirmed]"), "got: {message}");
        assert!(message.contains("Order confirmed."));
        assert!(message.contains("sink> ticket SIM-0001 registered"), "got: {message}");
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
        "ORDERLY_MATCHING_FUZZY_FLOOR",
        "ORDERLY_MATCHING_TIE_BREAK_FLOOR",
        "ORDERLY_MATCHING_TIE_BREAK_TOKENS",
        "ORDERLY_MATCHING_MAX_AMBIGUITY_OPTIONS",
        "ORDERLY_VALIDATION_FREIGHT_EXEMPT_INCOTERMS",
        "ORDERLY_LOGGING_LEVEL",
        "ORDERLY_LOGGING_FORMAT",
        "ORDERLY_LOG_LEVEL",
        "ORDERLY_LOG_FORMAT",
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
