pub mod issues;
pub mod record;

pub use issues::{AmbiguityOption, AmbiguityPrompt, IssueSet, MappingWarning};
pub use record::{DraftOrder, Field, FieldPatch, FinalizedOrder};
