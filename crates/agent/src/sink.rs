use anyhow::Result;
use async_trait::async_trait;

use orderly_core::FinalizedOrder;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketId(pub String);

/// Seam for whatever system receives confirmed orders. The engine never
/// creates tickets itself; the host calls the sink after a `confirmed` turn.
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn create(&self, order: &FinalizedOrder) -> Result<TicketId>;
}
