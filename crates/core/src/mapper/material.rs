//! Material resolution: code pass-through, then exact product name, then
//! name containment.

use tracing::{debug, info};

use crate::domain::{AmbiguityOption, AmbiguityPrompt, DraftOrder, Field, IssueSet};
use crate::normalize::normalize_compact;
use crate::reference::{MaterialRow, ReferenceIndex};

use super::present;

pub(super) fn resolve(index: &ReferenceIndex, draft: &mut DraftOrder, issues: &mut IssueSet) {
    let Some(input) = present(draft.get(Field::MaterialCode)) else {
        return;
    };
    let normalized = normalize_compact(&input);
    if normalized.is_empty() {
        issues.warn(
            Field::MaterialCode,
            input.clone(),
            format!("The material name '{input}' normalized to nothing."),
        );
        return;
    }

    if index.is_material_code(&normalized) {
        debug!(input = %input, "material input is a valid code");
        draft.set(Field::MaterialCode, Some(normalized));
        return;
    }

    let matches: Vec<&MaterialRow> = match index.material_by_exact_description(&normalized) {
        Some(row) => vec![row],
        None => index.materials_containing(&normalized),
    };

    match matches.len() {
        0 => {
            issues.warn(
                Field::MaterialCode,
                input.clone(),
                format!("The material '{input}' (code or name) was not found or is invalid."),
            );
        }
        1 => {
            info!(input = %input, code = %matches[0].code, "material resolved by name");
            let code = matches[0].code.clone();
            draft.set(Field::MaterialCode, Some(code));
        }
        _ => {
            let options: Vec<AmbiguityOption> = matches
                .iter()
                .map(|row| AmbiguityOption::new(row.code.clone(), row.description.clone()))
                .collect();
            let lines = options
                .iter()
                .enumerate()
                .map(|(position, option)| {
                    format!("{}. {} (code: {})", position + 1, option.description, option.code)
                })
                .collect::<Vec<_>>()
                .join("\n");
            issues.ambiguities.push(AmbiguityPrompt {
                field: Field::MaterialCode,
                origin_field: Field::MaterialCode,
                original_value: input.clone(),
                question: format!(
                    "I found several materials that could match '{input}':\n{lines}\n\
                     Which one is correct? (Reply with the number or the code)"
                ),
                options,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn run(value: &str) -> (DraftOrder, IssueSet) {
        let index = fixtures::reference_index();
        let mut draft = DraftOrder::default();
        draft.set(Field::MaterialCode, Some(value.to_string()));
        let mut issues = IssueSet::default();
        resolve(&index, &mut draft, &mut issues);
        (draft, issues)
    }

    #[test]
    fn valid_code_is_kept_normalized() {
        let (draft, issues) = run("30001");
        assert!(issues.is_empty());
        assert_eq!(draft.get(Field::MaterialCode), Some("30001"));
    }

    #[test]
    fn unique_name_maps_to_its_code() {
        let (draft, issues) = run("FS Ouro");
        assert!(issues.is_empty());
        assert_eq!(draft.get(Field::MaterialCode), Some("30001"));
    }

    #[test]
    fn shared_name_fragment_is_ambiguous() {
        let (draft, issues) = run("farelo");
        assert_eq!(issues.ambiguities.len(), 1);
        assert!(issues.ambiguities[0].options.len() >= 2);
        assert_eq!(draft.get(Field::MaterialCode), Some("farelo"));
    }

    #[test]
    fn unknown_material_is_a_warning() {
        let (draft, issues) = run("granito polido");
        assert_eq!(issues.warnings.len(), 1);
        assert_eq!(draft.get(Field::MaterialCode), Some("granito polido"));
    }
}
