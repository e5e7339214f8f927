//! Plant resolution: short uppercase site codes that users drop anywhere in
//! the utterance rather than in a dedicated phrase.

use tracing::{debug, warn};

use crate::domain::{AmbiguityOption, AmbiguityPrompt, DraftOrder, Field, IssueSet};
use crate::normalize::normalize_compact;
use crate::reference::ReferenceIndex;

use super::present;

pub(super) fn resolve(
    index: &ReferenceIndex,
    draft: &mut DraftOrder,
    issues: &mut IssueSet,
    raw_utterance: &str,
) {
    let codes = index.plant_codes();
    if codes.is_empty() {
        return;
    }

    let extracted = present(draft.get(Field::Plant));
    let mut resolved: Option<String> = None;

    if let Some(extracted) = &extracted {
        let normalized = normalize_compact(extracted).to_uppercase();
        if codes.contains(&normalized) {
            resolved = Some(normalized);
        } else {
            // "FS PDL" or "CADÊNCIA LRV": a valid code buried in the value.
            let contained: Vec<&String> =
                codes.iter().filter(|code| normalized.contains(*code)).collect();
            match contained.len() {
                0 => {}
                1 => {
                    resolved = Some(contained[0].clone());
                    debug!(code = %contained[0], value = %extracted, "plant code found inside extracted value");
                }
                _ => {
                    let options: Vec<AmbiguityOption> = contained
                        .iter()
                        .map(|code| {
                            AmbiguityOption::new(
                                code.as_str(),
                                format!("Code {code} (found in '{extracted}')"),
                            )
                        })
                        .collect();
                    let listed = contained
                        .iter()
                        .map(|code| code.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    issues.ambiguities.push(AmbiguityPrompt {
                        field: Field::Plant,
                        origin_field: Field::Plant,
                        original_value: extracted.clone(),
                        question: format!(
                            "Several valid plant codes ({listed}) appear in the plant value \
                             '{extracted}'. Which one is correct?\n{}",
                            numbered(&options)
                        ),
                        options,
                    });
                    warn!(value = %extracted, "multiple plant codes inside extracted value");
                    return;
                }
            }
        }
    }

    if resolved.is_none() && !raw_utterance.is_empty() {
        let upper = raw_utterance.to_uppercase();
        let found: Vec<&String> = codes.iter().filter(|code| upper.contains(*code)).collect();
        match found.len() {
            0 => {}
            1 => {
                resolved = Some(found[0].clone());
                debug!(code = %found[0], "plant code found in raw utterance");
            }
            _ => {
                let options: Vec<AmbiguityOption> = found
                    .iter()
                    .map(|code| {
                        AmbiguityOption::new(code.as_str(), format!("Code {code} (found in the request)"))
                    })
                    .collect();
                let listed = found
                    .iter()
                    .map(|code| code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                issues.ambiguities.push(AmbiguityPrompt {
                    field: Field::Plant,
                    origin_field: Field::Plant,
                    original_value: truncate(raw_utterance, 150),
                    question: format!(
                        "Several plant codes ({listed}) appear in your request. Which plant \
                         did you mean?\n{}",
                        numbered(&options)
                    ),
                    options,
                });
                warn!("multiple plant codes in raw utterance");
                return;
            }
        }
    }

    match resolved {
        Some(code) => draft.set(Field::Plant, Some(code)),
        None => {
            if let Some(extracted) = extracted {
                let known = codes.iter().cloned().collect::<Vec<_>>().join(", ");
                issues.warn(
                    Field::Plant,
                    extracted.clone(),
                    format!("The plant '{extracted}' is not a recognized plant code ({known})."),
                );
            }
        }
    }
}

fn numbered(options: &[AmbiguityOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(position, option)| format!("{}. {}", position + 1, option.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(limit).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn run(draft_plant: Option<&str>, utterance: &str) -> (DraftOrder, IssueSet) {
        let index = fixtures::reference_index();
        let mut draft = DraftOrder::default();
        draft.set(Field::Plant, draft_plant.map(str::to_string));
        let mut issues = IssueSet::default();
        resolve(&index, &mut draft, &mut issues, utterance);
        (draft, issues)
    }

    #[test]
    fn exact_code_is_uppercased_and_kept() {
        let (draft, issues) = run(Some("lrv"), "");
        assert_eq!(draft.get(Field::Plant), Some("LRV"));
        assert!(issues.is_empty());
    }

    #[test]
    fn code_inside_extracted_value_wins() {
        let (draft, issues) = run(Some("FS PDL"), "");
        assert_eq!(draft.get(Field::Plant), Some("PDL"));
        assert!(issues.is_empty());
    }

    #[test]
    fn falls_back_to_scanning_the_utterance() {
        let (draft, issues) = run(None, "pedido para retirar na SRS semana que vem");
        assert_eq!(draft.get(Field::Plant), Some("SRS"));
        assert!(issues.is_empty());
    }

    #[test]
    fn several_codes_in_utterance_is_an_ambiguity() {
        let (draft, issues) = run(None, "pode ser LRV ou PDL");
        assert_eq!(draft.get(Field::Plant), None);
        assert_eq!(issues.ambiguities.len(), 1);
        assert_eq!(issues.ambiguities[0].options.len(), 2);
    }

    #[test]
    fn unknown_value_becomes_a_warning() {
        let (draft, issues) = run(Some("fábrica norte"), "sem código nenhum");
        assert_eq!(draft.get(Field::Plant), Some("fábrica norte"));
        assert_eq!(issues.warnings.len(), 1);
        assert_eq!(issues.warnings[0].field, Field::Plant);
    }
}
