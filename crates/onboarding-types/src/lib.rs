//! Shared types for the onboarding workflow engine

pub mod ids;
pub mod model;
pub mod status;

pub use ids::*;
pub use model::*;
pub use status::*;

/// Errors raised while parsing identifiers and enum spellings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypesError {
    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidId {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unknown {kind} value '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
