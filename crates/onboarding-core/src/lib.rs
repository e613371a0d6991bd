//! Onboarding Core Library
//!
//! Orchestration core of the HR onboarding workflow engine: stage machine,
//! step dependency gating, integration triggers with retry bookkeeping,
//! exceptions and progress reporting, plus the adapters and repositories
//! the engine runs against.

pub mod config;
pub mod clients;
pub mod constants;
pub mod store;
pub mod workflow;
pub mod types;
pub mod error;
pub mod paths;

// Re-export main types for easy access
pub use config::OnboardingConfig;
pub use error::{OnboardingError, Result};

// Re-export all client types
pub use clients::{
    BackgroundCheckHttpClient,
    BackgroundCheckProviders,
    DocSearchClient,
    DocuSignClient,
    HttpEmployeeDirectory,
    StaticEmployeeDirectory,
};

// Re-export storage types
pub use store::{FileRepository, MemoryRepository, OnboardingRepository, WorkflowFilter};

// Re-export workflow types
pub use workflow::{
    IntegrationAdapters,
    OnboardingOrchestrator,
    ProgressSnapshot,
    RaiseExceptionRequest,
    WorkflowDetails,
};
