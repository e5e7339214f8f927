use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub matching: MatchingConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// Thresholds for fuzzy client matching and ambiguity presentation.
#[derive(Clone, Debug)]
pub struct MatchingConfig {
    /// Minimum similarity for a fuzzy client candidate to qualify.
    pub fuzzy_floor: f64,
    /// Minimum leading-token similarity used to break ties between
    /// candidates with close overall scores.
    pub tie_break_floor: f64,
    /// How many leading tokens the tie-break comparison looks at.
    pub tie_break_tokens: usize,
    /// Cap on options listed in a disambiguation question.
    pub max_ambiguity_options: usize,
}

#[derive(Clone, Debug)]
pub struct ValidationConfig {
    /// Incoterms under which the freight value is informative rather than
    /// mandatory.
    pub freight_exempt_incoterms: Vec<String>,
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
    pub log_format: Option<LogFormat>,
    pub fuzzy_floor: Option<f64>,
    pub tie_break_floor: Option<f64>,
    pub max_ambiguity_options: Option<usize>,
    pub freight_exempt_incoterms: Option<Vec<String>>,
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

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            validation: ValidationConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_floor: 0.70,
            tie_break_floor: 0.85,
            tie_break_tokens: 2,
            max_ambiguity_options: 5,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            freight_exempt_incoterms: vec!["FOB".to_string(), "TPD".to_string()],
        }
    }
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

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("orderly.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(matching) = patch.matching {
            if let Some(fuzzy_floor) = matching.fuzzy_floor {
                self.matching.fuzzy_floor = fuzzy_floor;
            }
            if let Some(tie_break_floor) = matching.tie_break_floor {
                self.matching.tie_break_floor = tie_break_floor;
            }
            if let Some(tie_break_tokens) = matching.tie_break_tokens {
                self.matching.tie_break_tokens = tie_break_tokens;
            }
            if let Some(max_ambiguity_options) = matching.max_ambiguity_options {
                self.matching.max_ambiguity_options = max_ambiguity_options;
            }
        }

        if let Some(validation) = patch.validation {
            if let Some(freight_exempt_incoterms) = validation.freight_exempt_incoterms {
                self.validation.freight_exempt_incoterms = freight_exempt_incoterms;
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
        if let Some(value) = read_env("ORDERLY_MATCHING_FUZZY_FLOOR") {
            self.matching.fuzzy_floor = parse_f64("ORDERLY_MATCHING_FUZZY_FLOOR", &value)?;
        }
        if let Some(value) = read_env("ORDERLY_MATCHING_TIE_BREAK_FLOOR") {
            self.matching.tie_break_floor = parse_f64("ORDERLY_MATCHING_TIE_BREAK_FLOOR", &value)?;
        }
        if let Some(value) = read_env("ORDERLY_MATCHING_TIE_BREAK_TOKENS") {
            self.matching.tie_break_tokens =
                parse_usize("ORDERLY_MATCHING_TIE_BREAK_TOKENS", &value)?;
        }
        if let Some(value) = read_env("ORDERLY_MATCHING_MAX_AMBIGUITY_OPTIONS") {
            self.matching.max_ambiguity_options =
                parse_usize("ORDERLY_MATCHING_MAX_AMBIGUITY_OPTIONS", &value)?;
        }

        if let Some(value) = read_env("ORDERLY_VALIDATION_FREIGHT_EXEMPT_INCOTERMS") {
            self.validation.freight_exempt_incoterms = value
                .split(',')
                .map(|term| term.trim().to_uppercase())
                .filter(|term| !term.is_empty())
                .collect();
        }

        let log_level = read_env("ORDERLY_LOGGING_LEVEL").or_else(|| read_env("ORDERLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ORDERLY_LOGGING_FORMAT").or_else(|| read_env("ORDERLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(fuzzy_floor) = overrides.fuzzy_floor {
            self.matching.fuzzy_floor = fuzzy_floor;
        }
        if let Some(tie_break_floor) = overrides.tie_break_floor {
            self.matching.tie_break_floor = tie_break_floor;
        }
        if let Some(max_ambiguity_options) = overrides.max_ambiguity_options {
            self.matching.max_ambiguity_options = max_ambiguity_options;
        }
        if let Some(freight_exempt_incoterms) = overrides.freight_exempt_incoterms {
            self.validation.freight_exempt_incoterms = freight_exempt_incoterms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_matching(&self.matching)?;
        validate_validation(&self.validation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("orderly.toml"), PathBuf::from("config/orderly.toml")]
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

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    if !(matching.fuzzy_floor > 0.0 && matching.fuzzy_floor <= 1.0) {
        return Err(ConfigError::Validation(
            "matching.fuzzy_floor must be in range (0, 1]".to_string(),
        ));
    }

    if !(matching.tie_break_floor > 0.0 && matching.tie_break_floor <= 1.0) {
        return Err(ConfigError::Validation(
            "matching.tie_break_floor must be in range (0, 1]".to_string(),
        ));
    }

    if matching.tie_break_tokens == 0 {
        return Err(ConfigError::Validation(
            "matching.tie_break_tokens must be greater than zero".to_string(),
        ));
    }

    if matching.max_ambiguity_options == 0 {
        return Err(ConfigError::Validation(
            "matching.max_ambiguity_options must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_validation(validation: &ValidationConfig) -> Result<(), ConfigError> {
    for term in &validation.freight_exempt_incoterms {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "validation.freight_exempt_incoterms must not contain empty entries".to_string(),
            ));
        }
        if trimmed != trimmed.to_uppercase() {
            return Err(ConfigError::Validation(format!(
                "validation.freight_exempt_incoterms entries must be uppercase (got `{term}`)"
            )));
        }
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

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    matching: Option<MatchingPatch>,
    validation: Option<ValidationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    fuzzy_floor: Option<f64>,
    tie_break_floor: Option<f64>,
    tie_break_tokens: Option<usize>,
    max_ambiguity_options: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationPatch {
    freight_exempt_incoterms: Option<Vec<String>>,
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

    use tempfile::TempDir;

    use super::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = EngineConfig::default();
        config.validate().map_err(|err| format!("default config failed validation: {err}"))?;
        ensure(config.matching.fuzzy_floor == 0.70, "fuzzy floor should default to 0.70")?;
        ensure(config.matching.max_ambiguity_options == 5, "option cap should default to 5")?;
        ensure(
            config.validation.freight_exempt_incoterms == ["FOB", "TPD"],
            "FOB and TPD should be freight exempt by default",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ORDERLY_LOG_LEVEL", "warn");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orderly.toml");
            fs::write(
                &path,
                r#"
[logging]
level = "${TEST_ORDERLY_LOG_LEVEL}"

[matching]
fuzzy_floor = 0.8
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = EngineConfig::load(LoadOptions {
                config_path: Some(path),
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should come from the environment")?;
            ensure(config.matching.fuzzy_floor == 0.8, "fuzzy floor should come from the file")?;
            Ok(())
        })();

        clear_vars(&["TEST_ORDERLY_LOG_LEVEL"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORDERLY_MATCHING_FUZZY_FLOOR", "0.9");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orderly.toml");
            fs::write(
                &path,
                r#"
[matching]
fuzzy_floor = 0.75
max_ambiguity_options = 3

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = EngineConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.matching.fuzzy_floor == 0.9, "env fuzzy floor should win over file")?;
            ensure(
                config.matching.max_ambiguity_options == 3,
                "file option cap should win over defaults",
            )?;
            ensure(config.logging.level == "debug", "override log level should win over file")?;
            Ok(())
        })();

        clear_vars(&["ORDERLY_MATCHING_FUZZY_FLOOR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORDERLY_LOG_LEVEL", "warn");
        env::set_var("ORDERLY_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = EngineConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["ORDERLY_LOG_LEVEL", "ORDERLY_LOG_FORMAT"]);
        result
    }

    #[test]
    fn floors_outside_unit_interval_are_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match EngineConfig::load(LoadOptions {
            overrides: ConfigOverrides { fuzzy_floor: Some(1.5), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure but config load succeeded".to_string()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("matching.fuzzy_floor")
        );
        ensure(has_message, "validation failure should mention matching.fuzzy_floor")
    }

    #[test]
    fn required_missing_file_is_an_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = match EngineConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected missing-file error but config load succeeded".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::MissingConfigFile(_)),
            "missing required file should surface as MissingConfigFile",
        )
    }
}
