use serde::{Deserialize, Serialize};

use super::Field;

/// A value the mapper could not resolve against the reference tables. The
/// raw value stays in the draft so the user sees what was understood; the
/// warning drives a targeted re-request on the next missing-field pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingWarning {
    pub field: Field,
    pub original_value: String,
    pub message: String,
}

/// One candidate offered to the user while resolving an ambiguity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityOption {
    pub code: String,
    pub description: String,
    /// Client candidates also carry the row's name and tax id so that picking
    /// an option can fill all three client fields at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// Fuzzy-match score in percent, present only for fuzzy client options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_similarity: Option<u8>,
}

impl AmbiguityOption {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        AmbiguityOption {
            code: code.into(),
            description: description.into(),
            name: None,
            tax_id: None,
            similarity: None,
            leading_similarity: None,
        }
    }
}

/// A question the engine must ask before the draft can advance: one value
/// matched several reference rows and only the user can pick one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityPrompt {
    /// The field whose value will be overwritten by the chosen option.
    pub field: Field,
    /// The field the ambiguous value arrived through, when it differs from
    /// `field` (a payment keyword that matched several term codes arrives
    /// through the method field but resolves the term field).
    pub origin_field: Field,
    pub original_value: String,
    pub question: String,
    pub options: Vec<AmbiguityOption>,
}

/// Everything one mapping pass produced besides resolved values. `errors`
/// holds fatal conditions (an unusable reference index); warnings and
/// ambiguities are the ordinary currency of non-resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSet {
    pub warnings: Vec<MappingWarning>,
    pub errors: Vec<String>,
    pub ambiguities: Vec<AmbiguityPrompt>,
}

impl IssueSet {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty() && self.ambiguities.is_empty()
    }

    pub fn warn(&mut self, field: Field, original_value: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(MappingWarning {
            field,
            original_value: original_value.into(),
            message: message.into(),
        });
    }

}
