//! Delivery-cadence parsing.
//!
//! Turns free-form schedule text ("40 t em fevereiro; 20 t em março") into a
//! sorted list of (month, year, quantity) entries. Lines are matched against
//! an ordered pattern table; the first pattern that matches a line wins.
//! Years are rarely written out, so the parser carries a running
//! (year, last month) pair and rolls the year forward whenever the month
//! sequence wraps around.

use std::str::FromStr;

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::normalize::normalize;

/// One delivery line: `quantity` tons in `month`/`year`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceEntry {
    pub month: u32,
    pub year: i32,
    pub quantity: Decimal,
}

impl CadenceEntry {
    fn render_line(&self) -> String {
        format!("{:02}.{}:{} ton", self.month, self.year, self.quantity)
    }
}

/// Canonical serialization, one `MM.YYYY:QTY ton` line per entry.
pub fn render(entries: &[CadenceEntry]) -> String {
    entries
        .iter()
        .map(CadenceEntry::render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse cadence text. `total_quantity` feeds the patterns that name a month
/// without a quantity; `negotiation_date` anchors the base year. `None`
/// means no line parsed at all, which callers treat as an invalid format.
pub fn parse(
    text: &str,
    total_quantity: Option<&str>,
    negotiation_date: Option<&str>,
) -> Option<Vec<CadenceEntry>> {
    parse_with_base_year(
        text,
        total_quantity,
        negotiation_date,
        chrono::Local::now().year(),
    )
}

fn parse_with_base_year(
    text: &str,
    total_quantity: Option<&str>,
    negotiation_date: Option<&str>,
    default_year: i32,
) -> Option<Vec<CadenceEntry>> {
    if text.trim().is_empty() {
        return None;
    }

    // Kept as the raw string; patterns that use it clean it themselves.
    let quantity_hint = total_quantity.filter(|raw| clean_quantity(raw).is_some());
    let lines = preprocess(text);
    if lines.is_empty() {
        warn!(input = text, "no usable cadence lines after preprocessing");
        return None;
    }

    let base_year = negotiation_year(negotiation_date, default_year);
    debug!(base_year, "cadence base year");
    let mut tracker = YearTracker::new(base_year);
    let mut entries: Vec<CadenceEntry> = Vec::new();

    for line in &lines {
        if is_header_line(line) {
            debug!(line, "skipping cadence header line");
            continue;
        }

        if is_packed_line_candidate(line) {
            let mut trial = tracker.clone();
            if let Some(packed) = parse_packed_line(line, &mut trial) {
                entries.extend(packed);
                tracker = trial;
                continue;
            }
        }

        match parse_single_line(line, quantity_hint, &mut tracker) {
            Some(entry) => entries.push(entry),
            None => warn!(line, "no cadence pattern matched line"),
        }
    }

    if entries.is_empty() {
        warn!(input = text, "no cadence line could be parsed");
        return None;
    }
    entries.sort_by_key(|entry| (entry.year, entry.month));
    Some(entries)
}

// --- preprocessing ---

static CLOSE_PAREN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\s+").unwrap());
static AND_CONNECTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+e\s+").unwrap());

/// `month[/year] (qty [unit])`, as a fragment of a comma-joined line.
static MONTH_PAREN_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(\d{2,4}))?\s*\(([\d.,]+)\s*(?:t|ton|tons?|toneladas)?\s*\)",
    )
    .unwrap()
});
static MONTH_PAREN_QTY_FULL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^([a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(\d{2,4}))?\s*\(([\d.,]+)\s*(?:t|ton|tons?|toneladas)?\s*\)$",
    )
    .unwrap()
});

/// `month [sep year] qty [unit]`, used to validate fragments of an " E "
/// joined line before committing to the split.
static ITEM_SHAPE_FULL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^([a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(\d{2,4}))?\s+(\d[\d.,]*)(?:\s*(?:t|ton|tons?|toneladas))?$",
    )
    .unwrap()
});

fn preprocess(text: &str) -> Vec<String> {
    let broken = text.trim().replace(';', "\n");
    let broken = CLOSE_PAREN_BREAK.replace_all(&broken, ")\n");

    let mut lines: Vec<String> = Vec::new();
    for raw_line in broken.split('\n') {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        // "maio (300 t), junho (300 t) e julho (300 t)" splits only when
        // every fragment is itself a complete month-parenthesis clause.
        if line.contains('(')
            && lower.contains("t)")
            && (line.contains(',') || lower.contains(" e "))
        {
            let joined = AND_CONNECTOR.replace_all(line, ",");
            let parts: Vec<&str> = joined
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            if !parts.is_empty()
                && parts.iter().all(|part| MONTH_PAREN_QTY_FULL.is_match(part))
            {
                debug!(line, "splitting comma-joined parenthesis clauses");
                lines.extend(parts.iter().map(|part| part.to_string()));
                continue;
            }
        }

        // "JAN/25 100 E FEV/25 100" splits on the connector when every
        // fragment is a complete month-quantity clause.
        if AND_CONNECTOR.is_match(line) && !MONTH_PAREN_QTY.is_match(line) {
            let parts: Vec<&str> = AND_CONNECTOR
                .split(line)
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect();
            if parts.len() > 1 && parts.iter().all(|part| ITEM_SHAPE_FULL.is_match(part)) {
                debug!(line, "splitting connector-joined clauses");
                lines.extend(parts.iter().map(|part| part.to_string()));
                continue;
            }
        }

        lines.push(line.to_string());
    }
    lines
}

fn is_header_line(line: &str) -> bool {
    matches!(
        line.to_uppercase().as_str(),
        "CADÊNCIA" | "CADENCIA" | "CADÊNCIA LRV" | "CADÊNCIA PDL" | "CADENCIA SRS"
    )
}

// --- year inference ---

#[derive(Clone)]
struct YearTracker {
    current_year: i32,
    previous_month: u32,
}

impl YearTracker {
    fn new(base_year: i32) -> Self {
        YearTracker {
            current_year: base_year,
            previous_month: 0,
        }
    }

    /// Pick the year for one entry and advance the running state. An
    /// explicit year overrides and resets month tracking; without one, a
    /// month smaller than the previous month rolls the year forward.
    fn resolve(&mut self, explicit: Option<&str>, month: u32) -> i32 {
        let year = match explicit.and_then(parse_explicit_year) {
            Some(explicit_year) => {
                if explicit_year != self.current_year {
                    self.previous_month = 0;
                }
                self.current_year = explicit_year;
                explicit_year
            }
            None => {
                if self.previous_month != 0 && month < self.previous_month {
                    self.current_year += 1;
                    self.previous_month = 0;
                }
                self.current_year
            }
        };
        self.previous_month = month;
        year
    }
}

fn parse_explicit_year(text: &str) -> Option<i32> {
    let year = match text.len() {
        2 => format!("20{text}").parse::<i32>().ok()?,
        4 => text.parse::<i32>().ok()?,
        _ => return None,
    };
    (2000..2100).contains(&year).then_some(year)
}

static FOUR_DIGIT_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

/// Base year for inference: the negotiation date when it carries one,
/// otherwise the supplied default (the current calendar year).
fn negotiation_year(negotiation_date: Option<&str>, default_year: i32) -> i32 {
    let Some(date) = negotiation_date else {
        return default_year;
    };
    let parts: Vec<&str> = date.split('/').map(str::trim).filter(|p| !p.is_empty()).collect();
    match parts.len() {
        3 => parse_explicit_year(parts[2]).unwrap_or(default_year),
        2 => {
            let (Ok(first), Ok(second)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>())
            else {
                return default_year;
            };
            // dd/mm carries no year; anything else is read as mm/yy.
            if (1..=31).contains(&first) && (1..=12).contains(&second) {
                default_year
            } else {
                parse_explicit_year(parts[1]).unwrap_or(default_year)
            }
        }
        1 if month_from_name(parts[0]).is_none() && parts[0].contains(' ') => FOUR_DIGIT_YEAR
            .captures(parts[0])
            .and_then(|captures| captures[1].parse::<i32>().ok())
            .filter(|year| (2000..2100).contains(year))
            .unwrap_or(default_year),
        _ => default_year,
    }
}

// --- months and quantities ---

fn month_from_name(name: &str) -> Option<u32> {
    let month = match normalize(name).as_str() {
        "jan" | "janeiro" => 1,
        "fev" | "fevereiro" => 2,
        "mar" | "marco" => 3,
        "abr" | "abril" => 4,
        "mai" | "maio" => 5,
        "jun" | "junho" => 6,
        "jul" | "julho" => 7,
        "ago" | "agosto" => 8,
        "set" | "setembro" => 9,
        "out" | "outubro" => 10,
        "nov" | "novembro" => 11,
        "dez" | "dezembro" => 12,
        _ => return None,
    };
    Some(month)
}

fn canonical_month(token: &str) -> Option<u32> {
    if token.chars().all(|character| character.is_ascii_digit()) {
        let month = token.parse::<u32>().ok()?;
        return (1..=12).contains(&month).then_some(month);
    }
    month_from_name(token)
}

/// Strip currency noise and disambiguate thousands vs decimal separators,
/// then validate as a decimal number.
pub fn clean_quantity(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .chars()
        .filter(|character| !matches!(character, 'R' | '$') && !character.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');
    if has_dot && has_comma {
        if cleaned.rfind('.') > cleaned.rfind(',') {
            cleaned = cleaned.replace(',', "");
        } else {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        }
    } else if has_comma {
        cleaned = cleaned.replace(',', ".");
    }

    if cleaned.matches('.').count() > 1 {
        let parts: Vec<&str> = cleaned.split('.').collect();
        let (last, rest) = parts.split_last()?;
        cleaned = if last.len() < 3 {
            format!("{}.{}", rest.concat(), last)
        } else {
            parts.concat()
        };
    }

    Decimal::from_str(&cleaned).ok()
}

// --- packed multi-item lines ---

static PACKED_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s*(?:t(?:ons?)?|toneladas)?\s*([a-zA-Zç]+)").unwrap()
});
static EXPLICIT_YEAR_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/.\-]\s*\d{2,4}\b").unwrap());

const SINGLE_ITEM_CONNECTORS: [&str; 10] = [
    " toneladas em ",
    " tonelada em ",
    " ton em ",
    " t em ",
    " un em ",
    " toneladas para ",
    " tonelada para ",
    " ton para ",
    " t para ",
    " un para ",
];

/// "40 fev 20 mar 58 abr" style lines: several quantity-month pairs with no
/// explicit year. Only attempted when nothing suggests a single-item shape.
fn is_packed_line_candidate(line: &str) -> bool {
    let lower = line.to_lowercase();
    if EXPLICIT_YEAR_MARK.is_match(line) {
        return false;
    }
    if SINGLE_ITEM_CONNECTORS
        .iter()
        .any(|connector| lower.contains(connector))
    {
        return false;
    }
    if lower.contains(" de ") {
        return false;
    }
    let comma_ok = |unit: &str| match (lower.rfind(','), lower.rfind(unit)) {
        (Some(comma), Some(word)) => comma < word,
        (Some(_), None) => true,
        (None, _) => true,
    };
    if lower.contains("toneladas") && !comma_ok("toneladas") {
        return false;
    }
    if lower.contains("ton ") && !comma_ok("ton") {
        return false;
    }
    line.matches(' ').count() > 1
}

fn parse_packed_line(line: &str, tracker: &mut YearTracker) -> Option<Vec<CadenceEntry>> {
    let mut entries = Vec::new();
    let mut last_match_end = 0usize;

    for captures in PACKED_ITEM.captures_iter(line) {
        let quantity_raw = &captures[1];
        let month_raw = &captures[2];
        let Some(month) = month_from_name(month_raw) else {
            warn!(month = month_raw, "unknown month in packed cadence line");
            continue;
        };
        let Some(quantity) = clean_quantity(quantity_raw) else {
            warn!(quantity = quantity_raw, "bad quantity in packed cadence line");
            continue;
        };
        let year = tracker.resolve(None, month);
        entries.push(CadenceEntry {
            month,
            year,
            quantity,
        });
        last_match_end = captures.get(0).map(|m| m.end()).unwrap_or(last_match_end);
    }

    // The packed interpretation only claims the line when its matches cover
    // most of it; otherwise a single-item pattern gets the chance.
    if !entries.is_empty() && last_match_end as f64 > line.len() as f64 * 0.7 {
        debug!(line, items = entries.len(), "packed cadence line parsed");
        Some(entries)
    } else {
        None
    }
}

// --- single-item pattern table ---

struct LinePattern {
    label: &'static str,
    regex: &'static Lazy<Regex>,
    uses_total_hint: bool,
}

static QTY_UNIT_EM_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|tonelada|toneladas|kg|un)\b\s+(?:em|para)\s+(?P<mes>[a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]?\s*(?P<ano>\d{2,4}))?\s*$",
    )
    .unwrap()
});
static MONTH_YEAR_DASH_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<mes>[a-zA-Zç]+)\s*[/.\-]\s*(?P<ano>\d{2,4})\s*-\s*(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas)\b",
    )
    .unwrap()
});
static MONTH_DE_YEAR_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<mes>[a-zA-Zç]+)(?:\s+(?:de|do)\s+(?P<ano_de>\d{2,4}))?(?:\s+(?P<ano_direto>\d{2,4}))?(?:(?:\s*,\s*)|\s+)(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas|kg|un)?\s*$",
    )
    .unwrap()
});
static QTY_UNIT_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas)?\b\s+(?P<mes>[a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(?P<ano>\d{2,4}))?",
    )
    .unwrap()
});
static MONTH_PAREN_QTY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<mes>[a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(?P<ano>\d{2,4}))?\s*\((?P<valor>[\d.,]+)\s*(?:t|ton|tons?|toneladas)?\s*\)",
    )
    .unwrap()
});
static MONTH_YEAR_COLON_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<mes>[a-zA-Zç]+|\d{1,2})\s*[/.\-]\s*(?P<ano>\d{2,4})\s*:\s*(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas)?\s*$",
    )
    .unwrap()
});
static MONTH_YEAR_QTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<mes>[a-zA-Zç]+|\d{1,2})(?:\s*[/.\-]\s*(?P<ano>\d{2,4}))?\s+(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas)?\b",
    )
    .unwrap()
});
static MONTH_DE_YEAR_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?P<mes>[a-zA-Zç]+|\d{1,2})\s+de\s+(?P<ano>\d{2,4})\s*$").unwrap()
});
static MONTH_SLASH_YEAR_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?P<mes>[a-zA-Zç]+|\d{1,2})\s*[/.\-]\s*(?P<ano>\d{2,4})\s*$").unwrap()
});
static QTY_UNIT_MONTH_YEAR_FLEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<valor>\d[\d.,]*)\s*(?:t|ton|tons?|toneladas|kg|un)\b(?:\s+(?:em|para|no|na|para o|para a))?\s+(?P<mes>[a-zA-Zç]+|\d{1,2})(?:\s+(?:de|do))?\s+(?P<ano>\d{2,4})\s*$",
    )
    .unwrap()
});

/// First match wins; order matters. The two hint-backed patterns sit near
/// the end so an explicit quantity always takes precedence.
static LINE_PATTERNS: [LinePattern; 10] = [
    LinePattern {
        label: "qty unit em month [year]",
        regex: &QTY_UNIT_EM_MONTH,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month/year - qty t",
        regex: &MONTH_YEAR_DASH_QTY,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month de year, qty",
        regex: &MONTH_DE_YEAR_QTY,
        uses_total_hint: false,
    },
    LinePattern {
        label: "qty t month[/year]",
        regex: &QTY_UNIT_MONTH,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month[/year] (qty t)",
        regex: &MONTH_PAREN_QTY_LINE,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month/year: qty",
        regex: &MONTH_YEAR_COLON_QTY,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month[/year] qty t",
        regex: &MONTH_YEAR_QTY,
        uses_total_hint: false,
    },
    LinePattern {
        label: "month de year (total)",
        regex: &MONTH_DE_YEAR_ONLY,
        uses_total_hint: true,
    },
    LinePattern {
        label: "month/year (total)",
        regex: &MONTH_SLASH_YEAR_ONLY,
        uses_total_hint: true,
    },
    LinePattern {
        label: "qty unit month year",
        regex: &QTY_UNIT_MONTH_YEAR_FLEX,
        uses_total_hint: false,
    },
];

fn parse_single_line(
    line: &str,
    quantity_hint: Option<&str>,
    tracker: &mut YearTracker,
) -> Option<CadenceEntry> {
    for pattern in &LINE_PATTERNS {
        let Some(captures) = pattern.regex.captures(line) else {
            continue;
        };

        let month_token = captures.name("mes").map(|m| m.as_str())?;
        let Some(month) = canonical_month(month_token) else {
            warn!(line, token = month_token, "month token not recognized");
            continue;
        };
        let explicit_year = captures
            .name("ano")
            .or_else(|| captures.name("ano_de"))
            .or_else(|| captures.name("ano_direto"))
            .map(|m| m.as_str().to_string());

        let quantity = if pattern.uses_total_hint {
            match quantity_hint {
                Some(hint) => clean_quantity(hint),
                None => {
                    warn!(line, "total-quantity hint needed but unavailable");
                    continue;
                }
            }
        } else {
            captures
                .name("valor")
                .and_then(|m| clean_quantity(m.as_str()))
        };
        let Some(quantity) = quantity else {
            warn!(line, "quantity did not parse as a number");
            continue;
        };

        let year = tracker.resolve(explicit_year.as_deref(), month);
        debug!(line, pattern = pattern.label, month, year, "cadence line parsed");
        return Some(CadenceEntry {
            month,
            year,
            quantity,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> Decimal {
        Decimal::from_str(text).unwrap()
    }

    fn parse_in_2025(text: &str, total: Option<&str>, date: Option<&str>) -> Vec<CadenceEntry> {
        parse_with_base_year(text, total, date, 2025).unwrap()
    }

    #[test]
    fn semicolon_separated_connector_lines() {
        let entries = parse_in_2025(
            "40 t em fevereiro; 20 t em marco; 58 t em abril",
            None,
            Some("10/01/2025"),
        );
        assert_eq!(
            render(&entries),
            "02.2025:40 ton\n03.2025:20 ton\n04.2025:58 ton"
        );
    }

    #[test]
    fn header_lines_are_skipped() {
        let entries = parse_in_2025("CADÊNCIA LRV; jan/25: 100; fev/25: 200", None, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].month, 1);
        assert_eq!(entries[1].month, 2);
    }

    #[test]
    fn year_rolls_forward_when_months_wrap() {
        let entries = parse_in_2025("nov 50; jan 50", None, Some("05/10/2025"));
        assert_eq!(entries[0].year, 2025);
        assert_eq!(entries[0].month, 11);
        assert_eq!(entries[1].year, 2026);
        assert_eq!(entries[1].month, 1);
    }

    #[test]
    fn explicit_year_resets_tracking() {
        let entries = parse_in_2025("nov/25 50; jan/25 50", None, None);
        assert_eq!(entries[0].year, 2025);
        assert_eq!(entries[1].year, 2025);
        // Sorted by (year, month): january first.
        assert_eq!(entries[0].month, 1);
    }

    #[test]
    fn negotiation_date_overrides_base_year() {
        let entries = parse_in_2025("mar 10", None, Some("02/01/2027"));
        assert_eq!(entries[0].year, 2027);
        let entries = parse_in_2025("mar 10", None, Some("03/26"));
        assert_eq!(entries[0].year, 2026);
        // dd/mm carries no year.
        let entries = parse_in_2025("mar 10", None, Some("02/01"));
        assert_eq!(entries[0].year, 2025);
    }

    #[test]
    fn total_quantity_fallback_patterns() {
        let entries = parse_in_2025("maio de 2025", Some("1.500"), None);
        assert_eq!(entries[0].quantity, dec("1.500"));
        assert_eq!(entries[0].month, 5);

        let entries = parse_in_2025("mai/25", Some("300"), None);
        assert_eq!(entries[0].quantity, dec("300"));

        assert!(parse_with_base_year("mai/25", None, None, 2025).is_none());
        // A hint that is not a number is as good as no hint.
        assert!(parse_with_base_year("mai/25", Some("umas 300"), None, 2025).is_none());
    }

    #[test]
    fn paren_clause_line_splits_on_comma_and_connector() {
        let entries = parse_in_2025(
            "maio (300 t), junho (300 t) e julho (300 t)",
            None,
            Some("01/04/2025"),
        );
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].month, 5);
        assert_eq!(entries[2].month, 7);
        assert!(entries.iter().all(|entry| entry.quantity == dec("300")));
    }

    #[test]
    fn packed_quantity_month_pairs() {
        let entries = parse_in_2025("40 fev 20 mar 58 abr", None, Some("10/01/2025"));
        assert_eq!(
            render(&entries),
            "02.2025:40 ton\n03.2025:20 ton\n04.2025:58 ton"
        );
    }

    #[test]
    fn connector_joined_items_split() {
        let entries = parse_in_2025("JAN/26 100 E FEV/26 150", None, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].year, 2026);
        assert_eq!(entries[1].quantity, dec("150"));
    }

    #[test]
    fn dash_and_colon_shapes() {
        let entries = parse_in_2025("março/25 - 120 ton", None, None);
        assert_eq!(entries[0].month, 3);
        assert_eq!(entries[0].quantity, dec("120"));

        let entries = parse_in_2025("10/2025: 75", None, None);
        assert_eq!(entries[0].month, 10);
        assert_eq!(entries[0].year, 2025);
    }

    #[test]
    fn unparseable_text_yields_none() {
        assert!(parse_with_base_year("entrega combinada depois", None, None, 2025).is_none());
        assert!(parse_with_base_year("   ", None, None, 2025).is_none());
    }

    #[test]
    fn out_of_range_numeric_month_is_rejected() {
        assert!(parse_with_base_year("13/25: 75", None, None, 2025).is_none());
    }

    #[test]
    fn quantity_cleaning_handles_separator_styles() {
        assert_eq!(clean_quantity("R$ 1.234,56"), Some(dec("1234.56")));
        assert_eq!(clean_quantity("1,234.56"), Some(dec("1234.56")));
        assert_eq!(clean_quantity("1234,5"), Some(dec("1234.5")));
        assert_eq!(clean_quantity("1.234.567"), Some(dec("1234567")));
        assert_eq!(clean_quantity("40"), Some(dec("40")));
        assert_eq!(clean_quantity("abc"), None);
    }

    #[test]
    fn render_pads_month_and_keeps_quantity_text() {
        let entries = vec![
            CadenceEntry {
                month: 2,
                year: 2025,
                quantity: dec("40"),
            },
            CadenceEntry {
                month: 12,
                year: 2025,
                quantity: dec("58.5"),
            },
        ];
        assert_eq!(render(&entries), "02.2025:40 ton\n12.2025:58.5 ton");
    }
}
