//! Collaborator traits consumed by the onboarding engine
//!
//! Each external system is a plain request/response call. Implementations
//! may be slow or fail; the engine applies its own deadline around every
//! adapter call and records the outcome.

use async_trait::async_trait;
use crate::error::Result;
use crate::types::*;
use onboarding_types::EmployeeId;

/// Employee lookup against the HR employee service
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Returns `None` when the employee does not exist
    async fn get_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Employee>>;
}

/// Document-signing provider (envelope per document)
#[async_trait]
pub trait DocumentSigningClient: Send + Sync {
    async fn send_envelope(&self, request: &EnvelopeRequest) -> Result<EnvelopeResponse>;
}

/// Background-check provider
#[async_trait]
pub trait BackgroundCheckClient: Send + Sync {
    async fn initiate_check(&self, request: &BackgroundCheckRequest) -> Result<BackgroundCheckResponse>;
}

/// Document-search provider
#[async_trait]
pub trait DocumentSearchClient: Send + Sync {
    async fn search_documents(&self, request: &DocumentSearchRequest) -> Result<DocumentSearchResponse>;
}
