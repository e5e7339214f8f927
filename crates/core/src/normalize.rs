//! String normalization primitives shared by the reference index, the field
//! mapper, and the cadence parser.
//!
//! All comparisons in the engine happen over normalized text: diacritics
//! stripped, lowercased, interior whitespace collapsed. Reference rows are
//! normalized once at index-build time with the same functions, so lookups
//! are plain string equality.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case-fold, strip diacritics, collapse whitespace. Idempotent.
///
/// A period sandwiched between letters ("f.s ouro") becomes a space, since
/// users type abbreviations with and without dots interchangeably.
pub fn normalize(text: &str) -> String {
    normalize_inner(text, false)
}

/// Like [`normalize`] but additionally treats hyphens as spaces, so
/// "ted-a-vista" and "ted a vista" compare equal. Used everywhere the
/// reference data was normalized hyphen-free.
pub fn normalize_compact(text: &str) -> String {
    normalize_inner(text, true)
}

fn normalize_inner(text: &str, remove_hyphens: bool) -> String {
    let stripped: String = text
        .nfd()
        .filter(|character| !is_combining_mark(*character))
        .collect::<String>()
        .to_lowercase();

    let mut out = String::with_capacity(stripped.len());
    let characters: Vec<char> = stripped.chars().collect();
    for (index, character) in characters.iter().enumerate() {
        let mapped = match character {
            '.' => {
                let prev_is_letter =
                    index > 0 && characters[index - 1].is_alphabetic();
                let next_is_letter = characters
                    .get(index + 1)
                    .is_some_and(|next| next.is_alphabetic());
                if prev_is_letter && next_is_letter {
                    ' '
                } else {
                    '.'
                }
            }
            '-' if remove_hyphens => ' ',
            other => *other,
        };
        out.push(mapped);
    }

    let collapsed = collapse_whitespace(&out);

    // Users glue "a vista" into one token often enough that the reference
    // data can only be matched by undoing it here.
    if collapsed == "avista" {
        return "a vista".to_string();
    }
    collapsed
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a CNPJ/CPF-style tax identifier down to its digits: strips the
/// conventional `.`, `/` and `-` punctuation. Other characters are kept so a
/// garbage value stays visibly garbage instead of silently matching.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars()
        .filter(|character| !matches!(character, '.' | '/' | '-' | ' '))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize("Antecipação"), "antecipacao");
        assert_eq!(normalize("São José"), "sao jose");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  FS   Ouro  "), "fs ouro");
    }

    #[test]
    fn dot_between_letters_becomes_space() {
        assert_eq!(normalize("f.s ouro"), "f s ouro");
        // Decimal points are untouched.
        assert_eq!(normalize("1.234"), "1.234");
    }

    #[test]
    fn compact_removes_hyphens() {
        assert_eq!(normalize_compact("ted-a-vista"), "ted a vista");
        assert_eq!(normalize("ted-a-vista"), "ted-a-vista");
    }

    #[test]
    fn glued_avista_is_split() {
        assert_eq!(normalize("AVISTA"), "a vista");
        assert_eq!(normalize_compact("à-vista"), "a vista");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Condição de Pagamento", "  boleto  15   dias ", "ANTECIPAÇÃO", "a-vista"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
            let compact = normalize_compact(input);
            assert_eq!(normalize_compact(&compact), compact);
        }
    }

    #[test]
    fn tax_id_keeps_only_digits_of_well_formed_ids() {
        assert_eq!(normalize_tax_id("040.074.561-51"), "04007456151");
        assert_eq!(normalize_tax_id("12.345.678/0001-99"), "12345678000199");
    }
}
