//! Client identity resolution, layered from strongest to weakest signal:
//! code+tax-id consistency, tax-id lookup, name containment, fuzzy name
//! match. The reference table is the source of truth: once a row is chosen,
//! its code, name and tax id overwrite whatever the user typed.

use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::domain::{AmbiguityOption, AmbiguityPrompt, DraftOrder, Field, IssueSet};
use crate::normalize::{normalize_compact, normalize_tax_id};
use crate::reference::{ClientRow, ReferenceIndex};

use super::present;

pub(super) fn resolve(
    index: &ReferenceIndex,
    matching: &MatchingConfig,
    draft: &mut DraftOrder,
    issues: &mut IssueSet,
) {
    let tax_extracted = present(draft.get(Field::TaxId));
    let name_extracted = present(draft.get(Field::ClientName));
    let code_extracted = present(draft.get(Field::ClientCode));

    let mut found = false;
    let mut ambiguous = false;

    // Stage 0: both code and tax id supplied. If they agree with the same
    // table row, that row wins outright; disagreement falls through to the
    // weaker lookups.
    if let (Some(code), Some(tax)) = (&code_extracted, &tax_extracted) {
        if let Some(row) = index.client_by_code(code) {
            let row = row.clone();
            if normalize_tax_id(&row.tax_id) == normalize_tax_id(tax) {
                info!(code = %code, "client code and tax id are consistent with the table");
                adopt(draft, &row, true);
                found = true;
            } else {
                warn!(
                    code = %code,
                    "tax id diverges from the table row for this client code"
                );
            }
        } else {
            warn!(code = %code, "client code not present in the reference table");
        }
    }

    // Stage 1: tax-id lookup. Duplicates are real in the table; a supplied
    // client code disambiguates, otherwise every row becomes an option.
    if !found {
        if let Some(tax) = &tax_extracted {
            let tax_norm = normalize_tax_id(tax);
            let rows: Vec<ClientRow> = index
                .clients_by_tax_id(&tax_norm)
                .into_iter()
                .cloned()
                .collect();
            match rows.len() {
                0 => {}
                1 => {
                    adopt(draft, &rows[0], true);
                    found = true;
                    info!(tax_id = %tax_norm, code = %rows[0].code, "client resolved by tax id");
                }
                _ => {
                    if let Some(code) = &code_extracted {
                        let chosen: Vec<&ClientRow> =
                            rows.iter().filter(|row| &row.code == code).collect();
                        if chosen.len() == 1 {
                            info!(code = %code, "duplicate tax id disambiguated by client code");
                            let row = chosen[0].clone();
                            adopt(draft, &row, true);
                            found = true;
                        } else {
                            ambiguous = true;
                        }
                    } else {
                        ambiguous = true;
                    }
                    if ambiguous {
                        let options: Vec<AmbiguityOption> = rows
                            .iter()
                            .map(|row| client_option(row, None, None))
                            .collect();
                        let lines = options
                            .iter()
                            .enumerate()
                            .map(|(position, option)| {
                                format!(
                                    "{}. {} (client code: {})",
                                    position + 1,
                                    option.name.as_deref().unwrap_or("?"),
                                    option.code
                                )
                            })
                            .collect::<Vec<_>>()
                            .join("\n");
                        issues.ambiguities.push(AmbiguityPrompt {
                            field: Field::ClientCode,
                            origin_field: Field::ClientName,
                            original_value: tax_norm.clone(),
                            question: format!(
                                "The tax id '{tax_norm}' is associated with several clients. \
                                 Please pick the right one (reply with the option number or \
                                 the client code):\n{lines}"
                            ),
                            options,
                        });
                        info!(tax_id = %tax_norm, "ambiguity raised for duplicate tax id");
                        draft.set(Field::ClientCode, None);
                        return;
                    }
                }
            }
        }
    }

    // Stage 2: normalized name containment.
    if !found && !ambiguous {
        if let Some(name) = &name_extracted {
            let fragment = normalize_compact(name);
            let rows: Vec<ClientRow> = index
                .clients_containing_name(&fragment)
                .into_iter()
                .cloned()
                .collect();
            match rows.len() {
                0 => {}
                1 => {
                    adopt(draft, &rows[0], tax_extracted.is_none());
                    found = true;
                    info!(name = %name, code = %rows[0].code, "client resolved by name containment");
                }
                _ => {
                    ambiguous = true;
                    let options: Vec<AmbiguityOption> = rows
                        .iter()
                        .map(|row| client_option(row, None, None))
                        .collect();
                    let lines = option_lines(&options);
                    issues.ambiguities.push(AmbiguityPrompt {
                        field: Field::ClientCode,
                        origin_field: Field::ClientName,
                        original_value: name.clone(),
                        question: format!(
                            "Several clients contain '{name}'. Please pick the right one \
                             (reply with the option number or the client code):\n{lines}"
                        ),
                        options,
                    });
                    info!(name = %name, matches = rows.len(), "ambiguity raised by name containment");
                }
            }
        }
    }

    // Stage 3: fuzzy fallback over normalized names, with a leading-token
    // tie-break so "fazenda santa X" does not match every "fazenda" row.
    if !found && !ambiguous {
        if let Some(name) = &name_extracted {
            let input_norm = normalize_compact(name);
            if !input_norm.is_empty() {
                let input_leading = leading_tokens(&input_norm, matching.tie_break_tokens);
                let mut candidates: Vec<(f64, f64, ClientRow)> = Vec::new();
                for (row, row_norm) in index.clients_with_normalized_names() {
                    let score = similarity(&input_norm, row_norm);
                    if score >= matching.fuzzy_floor {
                        let row_leading = leading_tokens(row_norm, matching.tie_break_tokens);
                        let tie_break =
                            strsim::normalized_levenshtein(&input_leading, &row_leading);
                        candidates.push((score, tie_break, row.clone()));
                    }
                }
                candidates.sort_by(|a, b| {
                    (b.0, b.1)
                        .partial_cmp(&(a.0, a.1))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let qualified: Vec<&(f64, f64, ClientRow)> = candidates
                    .iter()
                    .filter(|(_, tie_break, _)| *tie_break >= matching.tie_break_floor)
                    .collect();
                debug!(
                    raw = candidates.len(),
                    qualified = qualified.len(),
                    "fuzzy client candidates"
                );

                match qualified.len() {
                    0 => {}
                    1 => {
                        let (score, _, row) = qualified[0];
                        info!(name = %name, code = %row.code, score, "client resolved by fuzzy match");
                        let row = row.clone();
                        adopt(draft, &row, tax_extracted.is_none());
                        found = true;
                    }
                    _ => {
                        ambiguous = true;
                        let options: Vec<AmbiguityOption> = qualified
                            .iter()
                            .take(matching.max_ambiguity_options)
                            .map(|(score, tie_break, row)| {
                                client_option(row, Some(percent(*score)), Some(percent(*tie_break)))
                            })
                            .collect();
                        let mut lines = options
                            .iter()
                            .enumerate()
                            .map(|(position, option)| {
                                format!(
                                    "{}. {} (code: {}, tax id: {}, similarity: {}% / leading: {}%)",
                                    position + 1,
                                    option.name.as_deref().unwrap_or("?"),
                                    option.code,
                                    option.tax_id.as_deref().unwrap_or("N/A"),
                                    option.similarity.unwrap_or(0),
                                    option.leading_similarity.unwrap_or(0),
                                )
                            })
                            .collect::<Vec<_>>();
                        if qualified.len() > matching.max_ambiguity_options {
                            lines.push(format!(
                                "... and {} more.",
                                qualified.len() - matching.max_ambiguity_options
                            ));
                        }
                        issues.ambiguities.push(AmbiguityPrompt {
                            field: Field::ClientCode,
                            origin_field: Field::ClientName,
                            original_value: name.clone(),
                            question: format!(
                                "I found several clients with names similar to '{name}'. \
                                 Please pick the right one (reply with the option number or \
                                 the client code):\n{}",
                                lines.join("\n")
                            ),
                            options,
                        });
                        info!(name = %name, "ambiguity raised by fuzzy match");
                    }
                }
            }
        }
    }

    if !found {
        if ambiguous {
            // Extracted values stay visible for the question; the code is
            // cleared because it is exactly what the answer will fill.
            draft.set(Field::ClientCode, None);
        } else if name_extracted.is_some() || tax_extracted.is_some() || code_extracted.is_some() {
            let mut supplied = Vec::new();
            if let Some(name) = &name_extracted {
                supplied.push(format!("name '{name}'"));
            }
            if let Some(tax) = &tax_extracted {
                supplied.push(format!("tax id '{tax}'"));
            }
            if let Some(code) = &code_extracted {
                supplied.push(format!("code '{code}'"));
            }
            let (field, original) = if let Some(name) = &name_extracted {
                (Field::ClientName, name.clone())
            } else if let Some(tax) = &tax_extracted {
                (Field::TaxId, tax.clone())
            } else {
                (Field::ClientCode, code_extracted.clone().unwrap_or_default())
            };
            issues.warn(
                field,
                original,
                format!(
                    "No client found for {} (it may be new, or the data may be \
                     incomplete or incorrect).",
                    supplied.join(" and ")
                ),
            );
        }
    }
}

/// Overwrite the draft's client fields from the chosen table row. The tax id
/// is only replaced when the user did not supply one (or the row is
/// authoritative, e.g. resolved through the tax id itself).
fn adopt(draft: &mut DraftOrder, row: &ClientRow, overwrite_tax_id: bool) {
    draft.set(Field::ClientCode, Some(row.code.clone()));
    draft.set(Field::ClientName, Some(row.name.clone()));
    if overwrite_tax_id || draft.get(Field::TaxId).is_none() {
        draft.set(Field::TaxId, Some(normalize_tax_id(&row.tax_id)));
    }
}

fn client_option(
    row: &ClientRow,
    similarity: Option<u8>,
    leading_similarity: Option<u8>,
) -> AmbiguityOption {
    AmbiguityOption {
        code: row.code.clone(),
        description: row.name.clone(),
        name: Some(row.name.clone()),
        tax_id: Some(normalize_tax_id(&row.tax_id)),
        similarity,
        leading_similarity,
    }
}

fn option_lines(options: &[AmbiguityOption]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(position, option)| {
            format!(
                "{}. {} (code: {}, tax id: {})",
                position + 1,
                option.name.as_deref().unwrap_or("?"),
                option.code,
                option.tax_id.as_deref().unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Similarity in [0, 1]: the better of a plain edit-distance ratio and a
/// token-sorted one, so word order does not sink obvious matches.
fn similarity(a: &str, b: &str) -> f64 {
    let plain = strsim::normalized_levenshtein(a, b);
    let sorted = strsim::normalized_levenshtein(&sort_tokens(a), &sort_tokens(b));
    plain.max(sorted)
}

fn sort_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn leading_tokens(text: &str, count: usize) -> String {
    text.split_whitespace()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

fn percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}
