//! Field resolution against the reference index.
//!
//! One mapping pass takes the current draft plus the raw utterance and
//! rewrites resolvable values into canonical reference codes. Non-resolution
//! is never an error: an unmatched value produces a warning, a multi-match
//! produces an ambiguity prompt, and the draft keeps whatever the user said
//! so the question can quote it back.

mod client;
mod material;
mod payment;
mod plant;

use std::sync::Arc;

use crate::config::MatchingConfig;
use crate::domain::{DraftOrder, IssueSet};
use crate::reference::ReferenceIndex;

/// Result of one mapping pass: the (possibly rewritten) draft and the
/// issues the pass raised. Issues are regenerated from scratch every pass.
#[derive(Clone, Debug)]
pub struct MappingPass {
    pub draft: DraftOrder,
    pub issues: IssueSet,
}

pub struct FieldMapper {
    index: Arc<ReferenceIndex>,
    matching: MatchingConfig,
}

impl FieldMapper {
    pub fn new(index: Arc<ReferenceIndex>, matching: MatchingConfig) -> Self {
        FieldMapper { index, matching }
    }

    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    /// Run every per-field resolver over a copy of the draft. Pure: the
    /// input draft is untouched, and repeated passes over an already
    /// resolved draft are no-ops.
    pub fn map(&self, draft: &DraftOrder, raw_utterance: &str) -> MappingPass {
        let mut draft = draft.clone();
        let mut issues = IssueSet::default();

        if !self.index.is_usable() {
            issues
                .errors
                .push("reference tables are empty or not loaded".to_string());
            return MappingPass { draft, issues };
        }

        plant::resolve(&self.index, &mut draft, &mut issues, raw_utterance);
        client::resolve(&self.index, &self.matching, &mut draft, &mut issues);
        material::resolve(&self.index, &mut draft, &mut issues);
        payment::resolve_term(&self.index, &mut draft, &mut issues);
        payment::resolve_method(&self.index, &mut draft, &mut issues);

        MappingPass { draft, issues }
    }
}

/// Non-empty trimmed field value, as owned text.
fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Field;
    use crate::fixtures;

    fn mapper() -> FieldMapper {
        FieldMapper::new(Arc::new(fixtures::reference_index()), MatchingConfig::default())
    }

    #[test]
    fn unusable_index_is_a_fatal_error() {
        let empty = ReferenceIndex::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mapper = FieldMapper::new(Arc::new(empty), MatchingConfig::default());
        let pass = mapper.map(&DraftOrder::default(), "anything");
        assert_eq!(pass.issues.errors.len(), 1);
    }

    #[test]
    fn mapping_is_idempotent_on_resolved_drafts() {
        let mapper = mapper();
        let mut draft = DraftOrder::default();
        draft.set(Field::TaxId, Some("12.345.678/0001-01".to_string()));
        draft.set(Field::Plant, Some("LRV".to_string()));
        draft.set(Field::PaymentMethod, Some("boleto".to_string()));

        let first = mapper.map(&draft, "");
        let second = mapper.map(&first.draft, "");
        assert_eq!(first.draft, second.draft);
    }
}
