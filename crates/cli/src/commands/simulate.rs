use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use orderly_agent::{
    ConversationEngine, Extractor, Session, TicketId, TicketSink, TurnMeta, TurnStatus,
};
use orderly_core::{
    fixtures, EngineConfig, Field, FieldMapper, FieldPatch, FinalizedOrder, LoadOptions,
    MatchingConfig,
};

use super::CommandResult;

/// Replays a fixed script of extraction results; the conversation around it
/// (questions, mapping, confirmation) is entirely the engine's doing.
struct StubExtractor {
    patches: Mutex<VecDeque<FieldPatch>>,
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, _text: &str, _context: Option<&[Field]>) -> Result<FieldPatch> {
        self.patches
            .lock()
            .map_err(|_| anyhow!("simulation script lock poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("simulation script exhausted"))
    }
}

/// Hands out sequential ticket ids instead of talking to a ticket system.
#[derive(Default)]
struct RecordingSink {
    created: Mutex<Vec<TicketId>>,
}

#[async_trait]
impl TicketSink for RecordingSink {
    async fn create(&self, _order: &FinalizedOrder) -> Result<TicketId> {
        let mut created =
            self.created.lock().map_err(|_| anyhow!("ticket log lock poisoned"))?;
        let ticket = TicketId(format!("SIM-{:04}", created.len() + 1));
        created.push(ticket.clone());
        Ok(ticket)
    }
}

fn patch(entries: &[(Field, &str)]) -> FieldPatch {
    entries.iter().map(|(field, value)| (*field, Some((*value).to_string()))).collect()
}

/// A three-turn demo order: everything but the freight, then the freight the
/// engine asked for, then confirmation.
fn script() -> (Vec<&'static str>, Vec<FieldPatch>) {
    let turns = vec![
        "Pedido para a Fazenda Dois Irmãos, CNPJ 040.074.561-51, código 10002, planta LRV, \
         FS Ouro, boleto 15 dias, CIF, preço 1890,50, cidade Sorriso, negociado em 10/01/2025. \
         Cadência: 40 toneladas em fevereiro; 20 toneladas em março; 58 toneladas em abril",
        "frete 170",
        "sim",
    ];
    let patches = vec![
        patch(&[
            (Field::TaxId, "040.074.561-51"),
            (Field::ClientCode, "10002"),
            (Field::Plant, "LRV"),
            (Field::PaymentTerm, "15 dias"),
            (Field::PaymentMethod, "boleto"),
            (Field::MaterialCode, "FS Ouro"),
            (
                Field::Cadence,
                "40 toneladas em fevereiro; 20 toneladas em março; 58 toneladas em abril",
            ),
            (Field::NegotiationDate, "10/01/2025"),
            (Field::Incoterm, "CIF"),
            (Field::UnitPrice, "1890,50"),
            (Field::City, "Sorriso"),
        ]),
        patch(&[(Field::FreightPrice, "170")]),
    ];
    (turns, patches)
}

pub fn run() -> CommandResult {
    let config = match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("simulate", "config_validation", error.to_string(), 2)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                4,
            )
        }
    };

    let (turns, patches) = script();
    let extractor = StubExtractor { patches: Mutex::new(patches.into_iter().collect()) };
    let mapper =
        FieldMapper::new(Arc::new(fixtures::reference_index()), MatchingConfig::default());
    let engine = ConversationEngine::new(extractor, mapper, config);
    let sink = RecordingSink::default();
    let meta = TurnMeta { seller: Some("Maria Souza".to_string()), seller_email: None };

    let mut session = Session::new();
    let mut transcript = Vec::new();
    let mut final_status = None;
    let mut confirmed_order = None;

    for turn in turns {
        transcript.push(format!("user> {turn}"));
        let outcome = runtime.block_on(engine.process_turn(&mut session, turn, &meta));
        transcript.push(format!("engine[{:?}]> {}", outcome.status, outcome.message));
        final_status = Some(outcome.status);
        if outcome.status == TurnStatus::Confirmed {
            confirmed_order = outcome.payload;
        }
        if matches!(outcome.status, TurnStatus::Confirmed | TurnStatus::Aborted | TurnStatus::Error)
        {
            break;
        }
    }

    if let Some(order) = &confirmed_order {
        match runtime.block_on(sink.create(order)) {
            Ok(TicketId(ticket)) => transcript.push(format!("sink> ticket {ticket} registered")),
            Err(error) => {
                return CommandResult::failure(
                    "simulate",
                    "ticket_sink",
                    format!("confirmed order could not be handed off: {error}"),
                    4,
                )
            }
        }
    }

    let transcript = transcript.join("\n");
    match final_status {
        Some(TurnStatus::Confirmed) => CommandResult::success("simulate", transcript),
        _ => CommandResult::failure(
            "simulate",
            "conversation_incomplete",
            format!("scripted conversation did not reach confirmation:\n{transcript}"),
            5,
        ),
    }
}
