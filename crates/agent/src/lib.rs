//! Conversation layer for the order-intake engine.
//!
//! This crate turns the pure resolution core (`orderly-core`) into a
//! multi-turn dialogue:
//! 1. **Extraction** (`extractor`) — a pluggable async seam that translates
//!    one utterance into field/value pairs.
//! 2. **State machine** (`engine` + `session`) — collecting, ambiguity
//!    resolution, and final confirmation, one outcome per turn.
//! 3. **Hand-off** (`sink`) — confirmed orders go to whatever ticket system
//!    the host wires in.
//!
//! The extractor is strictly a translator. It never resolves codes, decides
//! what is missing, or phrases questions; those are deterministic decisions
//! made by the engine and the core mapper.

pub mod engine;
pub mod extractor;
pub mod session;
pub mod sink;

pub use engine::{ConversationEngine, TurnMeta, TurnOutcome, TurnStatus};
pub use extractor::Extractor;
pub use session::{ConversationState, Session};
pub use sink::{TicketId, TicketSink};
