use anyhow::Result;
use async_trait::async_trait;

use orderly_core::{Field, FieldPatch};

/// Seam for the natural-language field extractor. The extractor is strictly a
/// translator from free text to field/value pairs; it never resolves codes,
/// validates, or decides what to ask next. Those are deterministic decisions
/// made by the engine.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract a partial field patch from one utterance. `context_fields`
    /// carries the fields the engine just asked for, when any, so the
    /// extractor can bias toward them.
    async fn extract(&self, text: &str, context_fields: Option<&[Field]>) -> Result<FieldPatch>;
}
