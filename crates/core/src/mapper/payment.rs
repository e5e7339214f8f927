//! Payment condition and payment method resolution.
//!
//! Users routinely glue the two together ("boleto 15 dias", "ted a vista"),
//! so both resolvers fall back to a compound split: find the longest pair of
//! known spellings that tile the normalized input, one from each vocabulary,
//! and fill both fields atomically.

use tracing::{debug, info};

use crate::domain::{AmbiguityOption, AmbiguityPrompt, DraftOrder, Field, IssueSet};
use crate::normalize::normalize_compact;
use crate::reference::ReferenceIndex;

use super::present;

pub(super) fn resolve_term(
    index: &ReferenceIndex,
    draft: &mut DraftOrder,
    issues: &mut IssueSet,
) {
    let Some(input) = present(draft.get(Field::PaymentTerm)) else {
        return;
    };
    let normalized = normalize_compact(&input);

    if index.is_term_code(&normalized) {
        draft.set(Field::PaymentTerm, Some(normalized));
        return;
    }

    if let Some(code) = index.term_code_for(&normalized) {
        debug!(input = %input, code, "payment term resolved by direct term");
        let code = code.to_string();
        draft.set(Field::PaymentTerm, Some(code));
        return;
    }

    if attempt_split(index, &input, draft, issues) {
        info!(input = %input, "payment term resolved by compound split");
        return;
    }

    issues.warn(
        Field::PaymentTerm,
        input.clone(),
        format!(
            "The payment condition '{input}' was not found, is invalid, or could not \
             be split into known parts."
        ),
    );
}

pub(super) fn resolve_method(
    index: &ReferenceIndex,
    draft: &mut DraftOrder,
    issues: &mut IssueSet,
) {
    let Some(input) = present(draft.get(Field::PaymentMethod)) else {
        return;
    };
    if index.is_method_code(&input) {
        return;
    }
    let normalized = normalize_compact(&input);
    let mut found = false;

    if let Some(code) = index.method_code_for(&normalized) {
        debug!(input = %input, code, "payment method resolved by direct term");
        let code = code.to_string();
        draft.set(Field::PaymentMethod, Some(code));
        found = true;
    }

    if !found {
        if let Some(codes) = index.method_codes_for_keyword(&normalized) {
            if codes.len() == 1 {
                debug!(input = %input, code = %codes[0], "payment method resolved by keyword");
                draft.set(Field::PaymentMethod, Some(codes[0].clone()));
                found = true;
            } else {
                let options: Vec<AmbiguityOption> = codes
                    .iter()
                    .map(|code| {
                        let description = index
                            .method_by_code(code)
                            .map(|row| row.description.clone())
                            .unwrap_or_else(|| format!("Code {code}"));
                        AmbiguityOption::new(code.clone(), description)
                    })
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
                    field: Field::PaymentMethod,
                    origin_field: Field::PaymentMethod,
                    original_value: input.clone(),
                    question: format!(
                        "The payment method '{input}' can refer to more than one option. \
                         Which one did you mean?\n{lines}\n(Reply with the number or the code)"
                    ),
                    options,
                });
                info!(input = %input, "ambiguous payment-method keyword");
                return;
            }
        }
    }

    if !found && attempt_split(index, &input, draft, issues) {
        if draft
            .get(Field::PaymentMethod)
            .is_some_and(|value| index.is_method_code(value))
        {
            found = true;
        }
    }

    // Containment over descriptions, last resort before a warning.
    if !found
        && draft
            .get(Field::PaymentMethod)
            .is_some_and(|value| value == input || !index.is_method_code(value))
    {
        let matches = index.methods_containing(&normalized);
        match matches.len() {
            0 => {}
            1 => {
                debug!(input = %input, code = %matches[0].code, "payment method resolved by containment");
                let code = matches[0].code.clone();
                draft.set(Field::PaymentMethod, Some(code));
                found = true;
            }
            _ => {
                if draft.get(Field::PaymentMethod) == Some(input.as_str()) {
                    let options: Vec<AmbiguityOption> = matches
                        .iter()
                        .map(|row| AmbiguityOption::new(row.code.clone(), row.description.clone()))
                        .collect();
                    let lines = options
                        .iter()
                        .enumerate()
                        .map(|(position, option)| {
                            format!(
                                "{}. {} (code: {})",
                                position + 1,
                                option.description,
                                option.code
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    issues.ambiguities.push(AmbiguityPrompt {
                        field: Field::PaymentMethod,
                        origin_field: Field::PaymentMethod,
                        original_value: input.clone(),
                        question: format!(
                            "For the payment method '{input}', which of these options did \
                             you mean?\n{lines}\n(Reply with the number or the code)"
                        ),
                        options,
                    });
                    return;
                }
            }
        }
    }

    if !found && draft.get(Field::PaymentMethod) == Some(input.as_str()) {
        issues.warn(
            Field::PaymentMethod,
            input.clone(),
            format!("The payment method '{input}' was not found or is invalid."),
        );
    }
}

/// Try to read the value as `<method> <term>` or `<term> <method>` over the
/// normalized vocabularies, longest combined spelling first. On success both
/// payment fields are updated together and any stale not-found warnings for
/// this raw value are retracted.
fn attempt_split(
    index: &ReferenceIndex,
    raw_value: &str,
    draft: &mut DraftOrder,
    issues: &mut IssueSet,
) -> bool {
    let input = normalize_compact(raw_value);
    if input.is_empty() {
        return false;
    }

    let mut best: Option<(String, String, usize)> = None;
    let consider = |method_term: &str, term_term: &str, best: &mut Option<(String, String, usize)>| {
        let combined = method_term.len() + term_term.len();
        if best.as_ref().is_some_and(|(_, _, length)| *length >= combined) {
            return;
        }
        let method_code = index.method_code_for_any_term(method_term);
        let term_code = index.term_code_for(term_term);
        if let (Some(method_code), Some(term_code)) = (method_code, term_code) {
            *best = Some((method_code.to_string(), term_code.to_string(), combined));
        }
    };

    for method_term in index.method_vocabulary() {
        if let Some(rest) = split_remainder(&input, method_term, Anchor::Start) {
            consider(method_term, rest, &mut best);
        }
        if let Some(rest) = split_remainder(&input, method_term, Anchor::End) {
            consider(method_term, rest, &mut best);
        }
    }
    for term_term in index.term_vocabulary() {
        if let Some(rest) = split_remainder(&input, term_term, Anchor::Start) {
            consider(rest, term_term, &mut best);
        }
        if let Some(rest) = split_remainder(&input, term_term, Anchor::End) {
            consider(rest, term_term, &mut best);
        }
    }

    let Some((method_code, term_code, _)) = best else {
        debug!(value = raw_value, "no valid method/term split found");
        return false;
    };
    info!(value = raw_value, method = %method_code, term = %term_code, "compound payment value split");

    let method_current = draft.get(Field::PaymentMethod);
    if method_current.is_none() || method_current == Some(raw_value) {
        draft.set(Field::PaymentMethod, Some(method_code));
    }
    let term_current = draft.get(Field::PaymentTerm);
    if term_current.is_none() || term_current == Some(raw_value) {
        draft.set(Field::PaymentTerm, Some(term_code));
    }
    issues.warnings.retain(|warning| {
        !(matches!(warning.field, Field::PaymentMethod | Field::PaymentTerm)
            && warning.original_value == raw_value)
    });
    true
}

enum Anchor {
    Start,
    End,
}

/// The remainder of `input` after removing `piece` from one end, with a
/// whitespace boundary between them. Normalized inputs are space-collapsed,
/// so one space is the only separator that can occur.
fn split_remainder<'a>(input: &'a str, piece: &str, anchor: Anchor) -> Option<&'a str> {
    match anchor {
        Anchor::Start => input
            .strip_prefix(piece)
            .and_then(|rest| rest.strip_prefix(' '))
            .filter(|rest| !rest.is_empty()),
        Anchor::End => input
            .strip_suffix(piece)
            .and_then(|rest| rest.strip_suffix(' '))
            .filter(|rest| !rest.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn run(term: Option<&str>, method: Option<&str>) -> (DraftOrder, IssueSet) {
        let index = fixtures::reference_index();
        let mut draft = DraftOrder::default();
        draft.set(Field::PaymentTerm, term.map(str::to_string));
        draft.set(Field::PaymentMethod, method.map(str::to_string));
        let mut issues = IssueSet::default();
        resolve_term(&index, &mut draft, &mut issues);
        resolve_method(&index, &mut draft, &mut issues);
        (draft, issues)
    }

    #[test]
    fn direct_term_maps_to_code() {
        let (draft, issues) = run(Some("15 dias"), None);
        assert!(issues.is_empty());
        assert_eq!(draft.get(Field::PaymentTerm), Some("A015"));
    }

    #[test]
    fn compound_value_fills_both_fields_atomically() {
        let (draft, issues) = run(Some("boleto 15 dias"), None);
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(draft.get(Field::PaymentTerm), Some("A015"));
        assert_eq!(draft.get(Field::PaymentMethod), Some("D"));
    }

    #[test]
    fn hyphenated_compound_in_method_field_splits() {
        let (draft, issues) = run(None, Some("ted-a-vista"));
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(draft.get(Field::PaymentTerm), Some("A000"));
        assert_eq!(draft.get(Field::PaymentMethod), Some("T"));
    }

    #[test]
    fn ambiguous_keyword_raises_a_prompt() {
        let (draft, issues) = run(None, Some("antecipação"));
        assert_eq!(issues.ambiguities.len(), 1);
        let prompt = &issues.ambiguities[0];
        assert_eq!(prompt.field, Field::PaymentMethod);
        assert_eq!(prompt.options.len(), 2);
        // The raw value stays until the user picks an option.
        assert_eq!(draft.get(Field::PaymentMethod), Some("antecipação"));
    }

    #[test]
    fn unknown_term_is_a_warning_with_the_raw_value() {
        let (draft, issues) = run(Some("pagamento em conchas"), None);
        assert_eq!(issues.warnings.len(), 1);
        assert_eq!(issues.warnings[0].field, Field::PaymentTerm);
        assert_eq!(draft.get(Field::PaymentTerm), Some("pagamento em conchas"));
    }

    #[test]
    fn split_retracts_earlier_warning_for_same_value() {
        // The term resolver warns first; the method resolver's split of the
        // same raw value then retracts it.
        let index = fixtures::reference_index();
        let mut draft = DraftOrder::default();
        draft.set(Field::PaymentTerm, Some("ted a vista".to_string()));
        let mut issues = IssueSet::default();
        resolve_term(&index, &mut draft, &mut issues);
        assert!(issues.warnings.is_empty(), "split should handle it: {issues:?}");
        assert_eq!(draft.get(Field::PaymentTerm), Some("A000"));
        assert_eq!(draft.get(Field::PaymentMethod), Some("T"));
    }

    #[test]
    fn method_code_passes_through_untouched() {
        let (draft, issues) = run(None, Some("D"));
        assert!(issues.is_empty());
        assert_eq!(draft.get(Field::PaymentMethod), Some("D"));
    }
}
