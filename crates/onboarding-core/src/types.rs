//! Collaborator-facing types: employees and integration adapter payloads

use chrono::{DateTime, Utc};
use onboarding_types::{EmployeeId, Payload};
use serde::{Deserialize, Serialize};

/// Employee as returned by the HR employee service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Document-signing request (one envelope, one signer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeRequest {
    pub document_type: String,
    pub signer_email: String,
    pub signer_name: String,
    pub employee_id: EmployeeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    pub envelope_id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
    pub signer_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCheckRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub check_types: Vec<String>,
    pub employee_id: EmployeeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCheckResponse {
    pub check_id: String,
    pub status: String,
    pub candidate: String,
    pub check_types: Vec<String>,
    pub initiated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSearchRequest {
    pub query: String,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub documents: Vec<FoundDocument>,
}

/// One hit of a document search, with its storage location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundDocument {
    pub name: String,
    #[serde(rename = "type", alias = "document_type")]
    pub document_type: String,
    pub storage_key: String,
    pub file_type: String,
    #[serde(alias = "size_bytes")]
    pub size: u64,
    #[serde(default)]
    pub metadata: Payload,
}

/// Caller-supplied parameters of a document-signing trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocuSignParams {
    pub document_type: String,
}

/// Caller-supplied parameters of a background-check trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundCheckParams {
    pub check_types: Vec<String>,
    /// Provider name; the configured default when absent
    #[serde(default)]
    pub provider: Option<String>,
}

/// Caller-supplied parameters of a document-search trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSearchParams {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
}
