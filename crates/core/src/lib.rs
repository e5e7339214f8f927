pub mod cadence;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod mapper;
pub mod normalize;
pub mod reference;
pub mod summary;

pub use cadence::CadenceEntry;
pub use config::{
    ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat, LoggingConfig,
    MatchingConfig, ValidationConfig,
};
pub use domain::{
    AmbiguityOption, AmbiguityPrompt, DraftOrder, Field, FieldPatch, FinalizedOrder, IssueSet,
    MappingWarning,
};
pub use errors::{DomainError, EngineError};
pub use mapper::{FieldMapper, MappingPass};
pub use reference::{
    ClientRow, MaterialRow, PaymentMethodRow, PaymentTermRow, PlantRow, ReferenceIndex,
};
