use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use orderly_core::{EngineConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "matching.fuzzy_floor",
        &config.matching.fuzzy_floor.to_string(),
        source("matching.fuzzy_floor", "ORDERLY_MATCHING_FUZZY_FLOOR"),
    ));
    lines.push(render_line(
        "matching.tie_break_floor",
        &config.matching.tie_break_floor.to_string(),
        source("matching.tie_break_floor", "ORDERLY_MATCHING_TIE_BREAK_FLOOR"),
    ));
    lines.push(render_line(
        "matching.tie_break_tokens",
        &config.matching.tie_break_tokens.to_string(),
        source("matching.tie_break_tokens", "ORDERLY_MATCHING_TIE_BREAK_TOKENS"),
    ));
    lines.push(render_line(
        "matching.max_ambiguity_options",
        &config.matching.max_ambiguity_options.to_string(),
        source("matching.max_ambiguity_options", "ORDERLY_MATCHING_MAX_AMBIGUITY_OPTIONS"),
    ));
    lines.push(render_line(
        "validation.freight_exempt_incoterms",
        &config.validation.freight_exempt_incoterms.join(","),
        source(
            "validation.freight_exempt_incoterms",
            "ORDERLY_VALIDATION_FREIGHT_EXEMPT_INCOTERMS",
        ),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "ORDERLY_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "ORDERLY_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("orderly.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/orderly.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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
