use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::Field;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("mandatory field {0:?} is missing")]
    MissingMandatoryField(Field),
    #[error("delivery schedule could not be parsed: {0}")]
    CadenceUnparseable(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("extraction failure: {0}")]
    Extraction(String),
    #[error("reference data failure: {0}")]
    ReferenceData(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl EngineError {
    /// A safe message to show in the conversation when a turn fails. The
    /// underlying error goes to the logs, never to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => {
                "Your request could not be processed as an order. Check the values and try again."
            }
            Self::Extraction(_) => {
                "I could not read your message right now. Please try again in a moment."
            }
            Self::ReferenceData(_) => {
                "The reference tables are unavailable, so the order cannot be matched right now."
            }
            Self::Configuration(_) => "An unexpected internal error occurred.",
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{DomainError, EngineError};
    use crate::domain::Field;

    #[test]
    fn domain_errors_wrap_into_engine_errors() {
        let error = EngineError::from(DomainError::MissingMandatoryField(Field::TaxId));
        assert!(matches!(error, EngineError::Domain(_)));
    }

    #[test]
    fn user_messages_do_not_leak_details() {
        let error = EngineError::ReferenceData("sheet parse failed at row 12".to_string());
        assert!(!error.user_message().contains("row 12"));
    }
}
