//! Workflow engine module

pub mod dependency;
pub mod integration;
pub mod orchestrator;
pub mod progress;
pub mod stage;
pub mod templates;
pub mod traits;

pub use integration::{IntegrationAdapters, IntegrationTrigger};
pub use orchestrator::{OnboardingOrchestrator, RaiseExceptionRequest, WorkflowDetails};
pub use progress::ProgressSnapshot;
pub use stage::StageOutcome;
pub use templates::{template_for, template_names, StepTemplate, WorkflowTemplate};
pub use traits::{BackgroundCheckClient, DocumentSearchClient, DocumentSigningClient, EmployeeDirectory};
