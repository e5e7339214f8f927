//! Turn-based conversation engine.
//!
//! Each turn the engine looks at the session state, consumes one utterance,
//! and returns exactly one outcome. All resolution and validation is
//! deterministic; the extractor is only ever asked to translate text into
//! field/value pairs.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use orderly_core::cadence;
use orderly_core::mapper::FieldMapper;
use orderly_core::normalize::normalize;
use orderly_core::summary;
use orderly_core::{
    AmbiguityOption, AmbiguityPrompt, EngineConfig, EngineError, Field, FieldPatch, FinalizedOrder,
};

use crate::extractor::Extractor;
use crate::session::{ConversationState, Session};

/// Confirmation vocabulary, matched against the whole normalized utterance.
const ACCEPT_WORDS: [&str; 8] = ["sim", "s", "yes", "y", "ok", "correto", "confirmar", "confirmo"];
const REJECT_WORDS: [&str; 5] = ["nao", "n", "no", "incorreto", "cancelar"];

/// Fields an order cannot be confirmed without. Freight is conditional on
/// the incoterm and handled separately.
const MANDATORY_FIELDS: [Field; 11] = [
    Field::TaxId,
    Field::Plant,
    Field::PaymentTerm,
    Field::PaymentMethod,
    Field::MaterialCode,
    Field::Cadence,
    Field::Seller,
    Field::City,
    Field::NegotiationDate,
    Field::Incoterm,
    Field::UnitPrice,
];

/// Fields whose value must resolve to a reference code; a mapper warning on
/// one of these with the value still unresolved re-requests the field.
const MAPPED_FIELDS: [Field; 3] = [Field::PaymentTerm, Field::PaymentMethod, Field::MaterialCode];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    NeedsInput,
    NeedsConfirmation,
    Confirmed,
    Aborted,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub message: String,
    pub payload: Option<FinalizedOrder>,
}

impl TurnOutcome {
    fn needs_input(message: impl Into<String>) -> Self {
        TurnOutcome { status: TurnStatus::NeedsInput, message: message.into(), payload: None }
    }
}

/// Channel-level context for one turn: who is talking, as known to the host.
#[derive(Clone, Debug, Default)]
pub struct TurnMeta {
    pub seller: Option<String>,
    pub seller_email: Option<String>,
}

pub struct ConversationEngine<E> {
    extractor: E,
    mapper: FieldMapper,
    config: EngineConfig,
}

impl<E: Extractor> ConversationEngine<E> {
    pub fn new(extractor: E, mapper: FieldMapper, config: EngineConfig) -> Self {
        ConversationEngine { extractor, mapper, config }
    }

    pub async fn process_turn(
        &self,
        session: &mut Session,
        text: &str,
        meta: &TurnMeta,
    ) -> TurnOutcome {
        session.last_utterance = text.to_string();

        match session.state.clone() {
            ConversationState::AmbiguityPending { prompt } => {
                self.handle_ambiguity(session, text, &prompt)
            }
            ConversationState::ConfirmationPending { payload } => {
                self.handle_confirmation(session, text, payload).await
            }
            ConversationState::Collecting { last_asked } => {
                self.handle_collecting(session, text, meta, last_asked).await
            }
        }
    }

    fn handle_ambiguity(
        &self,
        session: &mut Session,
        answer: &str,
        prompt: &AmbiguityPrompt,
    ) -> TurnOutcome {
        let Some(option) = resolve_choice(answer, &prompt.options) else {
            debug!(conversation = %session.id, answer, "ambiguity answer not understood");
            return TurnOutcome::needs_input(format!(
                "I couldn't understand your choice.\n\n{}",
                prompt.question
            ));
        };

        info!(conversation = %session.id, field = ?prompt.field, code = %option.code, "ambiguity resolved");
        session.draft.set(prompt.field, Some(option.code.clone()));
        if let Some(name) = &option.name {
            session.draft.set(Field::ClientName, Some(name.clone()));
        }
        if let Some(tax_id) = &option.tax_id {
            session.draft.set(Field::TaxId, Some(tax_id.clone()));
        }

        session.state = ConversationState::Collecting { last_asked: None };
        self.map_and_validate(session)
    }

    async fn handle_confirmation(
        &self,
        session: &mut Session,
        text: &str,
        payload: FinalizedOrder,
    ) -> TurnOutcome {
        let normalized = normalize(text);
        if ACCEPT_WORDS.contains(&normalized.as_str()) {
            info!(conversation = %session.id, "order confirmed");
            session.reset();
            return TurnOutcome {
                status: TurnStatus::Confirmed,
                message: "Order confirmed. The ticket request has been registered.".to_string(),
                payload: Some(payload),
            };
        }
        if REJECT_WORDS.contains(&normalized.as_str()) {
            info!(conversation = %session.id, "order rejected at confirmation");
            session.reset();
            return TurnOutcome {
                status: TurnStatus::Aborted,
                message: "Order cancelled. Send a new request whenever you want.".to_string(),
                payload: None,
            };
        }

        // Anything else is treated as a correction to the frozen order.
        let patch = match self.extractor.extract(text, None).await {
            Ok(patch) => sanitize(patch),
            Err(error) => {
                warn!(conversation = %session.id, %error, "extraction failed during correction");
                return TurnOutcome {
                    status: TurnStatus::NeedsConfirmation,
                    message: format!(
                        "{} Please confirm the order (yes/no) or restate the correction.",
                        EngineError::Extraction(error.to_string()).user_message()
                    ),
                    payload: None,
                };
            }
        };

        if patch.is_empty() {
            return TurnOutcome {
                status: TurnStatus::NeedsConfirmation,
                message: "I couldn't understand the correction. Please confirm the order \
                          (yes/no) or restate what should change."
                    .to_string(),
                payload: None,
            };
        }

        info!(conversation = %session.id, fields = patch.len(), "applying correction to frozen order");
        let mut draft = payload.order.clone();
        draft.apply_patch(&patch);
        session.draft = draft;
        session.state = ConversationState::Collecting { last_asked: None };
        self.map_and_validate(session)
    }

    async fn handle_collecting(
        &self,
        session: &mut Session,
        text: &str,
        meta: &TurnMeta,
        last_asked: Option<Vec<Field>>,
    ) -> TurnOutcome {
        if !session.draft.is_filled(Field::Seller) {
            if let Some(seller) = &meta.seller {
                session.draft.set(Field::Seller, Some(seller.clone()));
            }
        }
        if !session.draft.is_filled(Field::SellerEmail) {
            if let Some(email) = &meta.seller_email {
                session.draft.set(Field::SellerEmail, Some(email.clone()));
            }
        }

        let context = last_asked.as_deref();
        let patch = match self.extractor.extract(text, context).await {
            Ok(patch) => sanitize(patch),
            Err(error) => {
                warn!(conversation = %session.id, %error, "extraction failed");
                let message = session.last_question.clone().unwrap_or_else(|| {
                    EngineError::Extraction(error.to_string()).user_message().to_string()
                });
                return TurnOutcome::needs_input(message);
            }
        };

        let patch = match &last_asked {
            Some(requested) => {
                let filtered = filter_to_requested(patch, requested);
                if filtered.is_empty() {
                    debug!(conversation = %session.id, "answer had none of the requested fields");
                    let message = session
                        .last_question
                        .clone()
                        .unwrap_or_else(|| request_question(requested));
                    return TurnOutcome::needs_input(message);
                }
                filtered
            }
            None => patch,
        };

        session.draft.apply_patch(&patch);
        self.map_and_validate(session)
    }

    /// Shared tail of every state: run the mapper over the whole draft, then
    /// validate, and either ask for what is missing, surface an ambiguity,
    /// or freeze the order for confirmation.
    fn map_and_validate(&self, session: &mut Session) -> TurnOutcome {
        let pass = self.mapper.map(&session.draft, &session.last_utterance);
        session.draft = pass.draft;
        session.issues = pass.issues;

        if !session.issues.errors.is_empty() {
            let detail = session.issues.errors.join("; ");
            warn!(conversation = %session.id, %detail, "fatal mapping error");
            session.reset();
            return TurnOutcome {
                status: TurnStatus::Error,
                message: EngineError::ReferenceData(detail).user_message().to_string(),
                payload: None,
            };
        }

        if let Some(prompt) = session.issues.ambiguities.first().cloned() {
            let question = prompt.question.clone();
            session.last_question = Some(question.clone());
            session.state = ConversationState::AmbiguityPending { prompt };
            return TurnOutcome::needs_input(question);
        }

        if !session.draft.is_filled(Field::NegotiationDate) {
            let today = Local::now().date_naive().format("%d/%m/%Y").to_string();
            session.draft.set(Field::NegotiationDate, Some(today));
        }

        let mut asked: Vec<Field> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();
        let mut freight_incoterm: Option<String> = None;

        for field in MANDATORY_FIELDS {
            if is_absent(session.draft.get(field)) {
                asked.push(field);
                reasons.push(field.label().to_string());
            }
        }

        // Tax id identifies the client; a name on top of it is asked for once
        // so the wrong client is not silently accepted.
        if !is_absent(session.draft.get(Field::TaxId))
            && is_absent(session.draft.get(Field::ClientName))
            && !asked.contains(&Field::ClientName)
        {
            asked.push(Field::ClientName);
            reasons.push("client name (recommended, to confirm the right client)".to_string());
        }

        let incoterm = session
            .draft
            .get(Field::Incoterm)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_uppercase);
        if let Some(incoterm) = incoterm {
            let exempt = self.config.validation.freight_exempt_incoterms.contains(&incoterm);
            if !exempt && freight_is_absent(session.draft.get(Field::FreightPrice)) {
                asked.push(Field::FreightPrice);
                reasons.push(format!("freight price (mandatory for incoterm '{incoterm}')"));
                freight_incoterm = Some(incoterm);
            }
        }

        for warning in &session.issues.warnings {
            if MAPPED_FIELDS.contains(&warning.field)
                && session.draft.get(warning.field) == Some(warning.original_value.as_str())
                && !asked.contains(&warning.field)
            {
                asked.push(warning.field);
                reasons.push(format!(
                    "a valid {} ('{}' was not recognized)",
                    warning.field.label(),
                    warning.original_value
                ));
            }
        }

        let mut parsed_cadence: Option<Vec<cadence::CadenceEntry>> = None;
        if let Some(cadence_text) = session.draft.get(Field::Cadence) {
            if !is_absent(Some(cadence_text)) {
                parsed_cadence = cadence::parse(
                    cadence_text,
                    session.draft.get(Field::TotalQuantity),
                    session.draft.get(Field::NegotiationDate),
                );
                if parsed_cadence.is_none() && !asked.contains(&Field::Cadence) {
                    asked.push(Field::Cadence);
                    reasons.push(format!(
                        "the delivery schedule ('{cadence_text}' could not be understood; \
                         state it like '40 in February and 20 in March 2025')"
                    ));
                }
            }
        }

        if !asked.is_empty() {
            let question = match (&freight_incoterm, reasons.len()) {
                (Some(incoterm), 1) => {
                    format!("As the incoterm is '{incoterm}', please provide the freight price.")
                }
                _ => {
                    let list =
                        reasons.iter().map(|reason| format!("- {reason}")).collect::<Vec<_>>();
                    format!(
                        "To register the order I still need the following information:\n{}",
                        list.join("\n")
                    )
                }
            };
            debug!(conversation = %session.id, missing = asked.len(), "order incomplete");
            session.last_question = Some(question.clone());
            session.state = ConversationState::Collecting { last_asked: Some(asked) };
            return TurnOutcome::needs_input(question);
        }

        let Some(entries) = parsed_cadence else {
            // Cadence was mandatory and non-absent values were parse-checked
            // above, so this is unreachable; fail the turn rather than panic.
            session.reset();
            return TurnOutcome {
                status: TurnStatus::Error,
                message: EngineError::Domain(orderly_core::DomainError::InvariantViolation(
                    "validated order without a parsed delivery schedule".to_string(),
                ))
                .user_message()
                .to_string(),
                payload: None,
            };
        };

        let rendered = cadence::render(&entries);
        let mut order = session.draft.clone();
        order.set(Field::Cadence, Some(rendered.clone()));
        let summary_text = summary::render(&order, Some(&rendered), Local::now().date_naive());

        let payload = FinalizedOrder { order, cadence: entries, summary: summary_text.clone() };
        let message = format!(
            "{summary_text}\n\nPlease confirm the order above (yes/no), or type the information \
             you want to correct (e.g. 'Freight price is 500', 'City is Cuiabá')."
        );
        info!(conversation = %session.id, "order complete, awaiting confirmation");
        session.last_question = Some(message.clone());
        session.state = ConversationState::ConfirmationPending { payload: payload.clone() };
        TurnOutcome {
            status: TurnStatus::NeedsConfirmation,
            message,
            payload: Some(payload),
        }
    }
}

/// Match an ambiguity answer: a 1-based option number, an exact code, or an
/// exact description/name (normalized).
fn resolve_choice<'a>(answer: &str, options: &'a [AmbiguityOption]) -> Option<&'a AmbiguityOption> {
    let trimmed = answer.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        if index >= 1 && index <= options.len() {
            return Some(&options[index - 1]);
        }
        return None;
    }

    let normalized = normalize(trimmed);
    options.iter().find(|option| {
        normalize(&option.code) == normalized
            || normalize(&option.description) == normalized
            || option.name.as_deref().is_some_and(|name| normalize(name) == normalized)
    })
}

/// Drops extractor entries carrying the literal text "null"; the extractor
/// uses it for fields it saw nothing for.
fn sanitize(patch: FieldPatch) -> FieldPatch {
    patch
        .into_iter()
        .filter(|(_, value)| {
            value.as_deref().map_or(true, |text| !text.trim().eq_ignore_ascii_case("null"))
        })
        .collect()
}

/// Keep only entries answering what was asked. Asking for the client name
/// also admits the tax id and client code, since any of them identifies the
/// client.
fn filter_to_requested(patch: FieldPatch, requested: &[Field]) -> FieldPatch {
    let client_asked = requested.contains(&Field::ClientName);
    patch
        .into_iter()
        .filter(|(field, value)| {
            if value.is_none() {
                return false;
            }
            requested.contains(field)
                || (client_asked && matches!(field, Field::TaxId | Field::ClientCode))
        })
        .collect()
}

fn request_question(requested: &[Field]) -> String {
    let list = requested.iter().map(|field| format!("- {}", field.label())).collect::<Vec<_>>();
    format!("To register the order I still need the following information:\n{}", list.join("\n"))
}

fn is_absent(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => true,
        Some(text) => text.is_empty() || text.eq_ignore_ascii_case("null"),
    }
}

/// Freight counts as absent when missing, blank, "null", or zero; under CIF
/// a zero freight still has to be asked for.
fn freight_is_absent(value: Option<&str>) -> bool {
    if is_absent(value) {
        return true;
    }
    let text = value.unwrap_or_default().trim();
    cadence::clean_quantity(text).is_some_and(|amount| amount.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<AmbiguityOption> {
        vec![
            AmbiguityOption::new("E", "Antecipação 50%"),
            AmbiguityOption::new("F", "Antecipação 100%"),
        ]
    }

    #[test]
    fn choice_by_index_code_and_description_agree() {
        let options = options();
        let by_index = resolve_choice("2", &options).unwrap();
        let by_code = resolve_choice("f", &options).unwrap();
        let by_description = resolve_choice("Antecipação 100%", &options).unwrap();
        assert_eq!(by_index.code, "F");
        assert_eq!(by_code.code, "F");
        assert_eq!(by_description.code, "F");
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert!(resolve_choice("0", &options()).is_none());
        assert!(resolve_choice("3", &options()).is_none());
        assert!(resolve_choice("boleto", &options()).is_none());
    }

    #[test]
    fn null_entries_are_dropped() {
        let mut patch = FieldPatch::new();
        patch.insert(Field::City, Some("null".to_string()));
        patch.insert(Field::Plant, Some("LRV".to_string()));
        let patch = sanitize(patch);
        assert_eq!(patch.len(), 1);
        assert!(patch.contains_key(&Field::Plant));
    }

    #[test]
    fn client_name_request_admits_identity_fields() {
        let mut patch = FieldPatch::new();
        patch.insert(Field::TaxId, Some("04007456151".to_string()));
        patch.insert(Field::City, Some("Sorriso".to_string()));
        let filtered = filter_to_requested(patch, &[Field::ClientName]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key(&Field::TaxId));
    }

    #[test]
    fn zero_freight_counts_as_absent() {
        assert!(freight_is_absent(Some("0")));
        assert!(freight_is_absent(Some("0,00")));
        assert!(freight_is_absent(Some("null")));
        assert!(freight_is_absent(None));
        assert!(!freight_is_absent(Some("170")));
    }
}
