//! Error types for the onboarding engine

use onboarding_types::{IntegrationType, StepId};
use thiserror::Error;

/// Main error type for all onboarding operations
#[derive(Error, Debug)]
pub enum OnboardingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Step {step_id} has unmet dependencies: {}", format_ids(.unmet))]
    DependencyNotMet { step_id: StepId, unmet: Vec<StepId> },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Integration {integration} failed: {message}")]
    IntegrationFailure {
        integration: IntegrationType,
        message: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl OnboardingError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} {}", kind, id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_dependency_not_met(&self) -> bool {
        matches!(self, Self::DependencyNotMet { .. })
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition(_))
    }
}

fn format_ids(ids: &[StepId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

impl From<onboarding_types::TypesError> for OnboardingError {
    fn from(err: onboarding_types::TypesError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type for onboarding operations
pub type Result<T> = std::result::Result<T, OnboardingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OnboardingError::not_found("workflow", "wf-123");
        assert_eq!(err.to_string(), "Not found: workflow wf-123");
        assert!(err.is_not_found());

        let err = OnboardingError::IntegrationFailure {
            integration: IntegrationType::BackgroundCheck,
            message: "service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Integration background-check failed: service unavailable");
    }

    #[test]
    fn test_dependency_error_lists_unmet_steps() {
        let a = StepId::new();
        let b = StepId::new();
        let err = OnboardingError::DependencyNotMet {
            step_id: StepId::new(),
            unmet: vec![a.clone(), b.clone()],
        };
        let message = err.to_string();
        assert!(message.contains(a.as_str()));
        assert!(message.contains(b.as_str()));
        assert!(err.is_dependency_not_met());
    }
}
