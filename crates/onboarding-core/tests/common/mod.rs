//! Shared fixtures: adapter stubs, a static employee directory and an
//! orchestrator wired to an in-memory repository.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use onboarding_core::error::{OnboardingError, Result};
use onboarding_core::types::*;
use onboarding_core::workflow::{BackgroundCheckClient, DocumentSearchClient, DocumentSigningClient};
use onboarding_core::{
    BackgroundCheckProviders, IntegrationAdapters, MemoryRepository, OnboardingOrchestrator, OnboardingRepository,
    StaticEmployeeDirectory,
};
use onboarding_types::*;

pub const EMPLOYEE_ID: &str = "emp-1001";

pub fn employee() -> Employee {
    Employee {
        id: EmployeeId::new(EMPLOYEE_ID),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        manager_id: Some(EmployeeId::new("emp-1")),
    }
}

pub fn hr_user() -> UserId {
    UserId::new("hr-admin")
}

/// How a stub adapter answers
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(&'static str),
    /// Fail this many times, then succeed
    FailTimes(usize, &'static str),
    Delay(Duration),
}

pub struct StubAdapter {
    behavior: Behavior,
    integration: IntegrationType,
    calls: AtomicUsize,
}

impl StubAdapter {
    pub fn new(integration: IntegrationType, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            integration,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(self.failure(message)),
            Behavior::FailTimes(times, message) if call < *times => Err(self.failure(message)),
            Behavior::FailTimes(..) => Ok(()),
            Behavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }

    fn failure(&self, message: &str) -> OnboardingError {
        OnboardingError::IntegrationFailure {
            integration: self.integration,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl DocumentSigningClient for StubAdapter {
    async fn send_envelope(&self, request: &EnvelopeRequest) -> Result<EnvelopeResponse> {
        self.respond().await?;
        Ok(EnvelopeResponse {
            envelope_id: format!("env-{}", self.calls()),
            status: "sent".to_string(),
            sent_at: Utc::now(),
            signer_email: request.signer_email.clone(),
        })
    }
}

#[async_trait]
impl BackgroundCheckClient for StubAdapter {
    async fn initiate_check(&self, request: &BackgroundCheckRequest) -> Result<BackgroundCheckResponse> {
        self.respond().await?;
        Ok(BackgroundCheckResponse {
            check_id: format!("chk-{}", self.calls()),
            status: "pending".to_string(),
            candidate: format!("{} {}", request.first_name, request.last_name),
            check_types: request.check_types.clone(),
            initiated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl DocumentSearchClient for StubAdapter {
    async fn search_documents(&self, request: &DocumentSearchRequest) -> Result<DocumentSearchResponse> {
        self.respond().await?;
        let documents = vec![
            FoundDocument {
                name: "Employee Handbook".to_string(),
                document_type: "policy".to_string(),
                storage_key: "docs/handbook.pdf".to_string(),
                file_type: "pdf".to_string(),
                size: 482_133,
                metadata: Payload::new(),
            },
            FoundDocument {
                name: "Security Policy".to_string(),
                document_type: "policy".to_string(),
                storage_key: "docs/security.pdf".to_string(),
                file_type: "pdf".to_string(),
                size: 91_204,
                metadata: Payload::new(),
            },
        ];
        Ok(DocumentSearchResponse {
            total_count: documents.len() as u64,
            documents: documents.into_iter().take(request.limit as usize).collect(),
        })
    }
}

pub struct Stubs {
    pub signer: Arc<StubAdapter>,
    pub background_check: Arc<StubAdapter>,
    pub doc_search: Arc<StubAdapter>,
}

impl Stubs {
    pub fn succeeding() -> Self {
        Self::with(Behavior::Succeed, Behavior::Succeed, Behavior::Succeed)
    }

    pub fn with(signer: Behavior, background_check: Behavior, doc_search: Behavior) -> Self {
        Self {
            signer: StubAdapter::new(IntegrationType::DocuSign, signer),
            background_check: StubAdapter::new(IntegrationType::BackgroundCheck, background_check),
            doc_search: StubAdapter::new(IntegrationType::DocSearch, doc_search),
        }
    }

    pub fn adapters(&self) -> IntegrationAdapters {
        IntegrationAdapters {
            docusign: self.signer.clone(),
            background_checks: BackgroundCheckProviders::single("checkr", self.background_check.clone()),
            doc_search: self.doc_search.clone(),
        }
    }
}

pub struct Harness {
    pub orchestrator: Arc<OnboardingOrchestrator>,
    pub repository: Arc<dyn OnboardingRepository>,
    pub stubs: Stubs,
}

pub fn harness() -> Harness {
    harness_with(Stubs::succeeding())
}

pub fn harness_with(stubs: Stubs) -> Harness {
    harness_on(Arc::new(MemoryRepository::new()), stubs, None)
}

pub fn harness_on(
    repository: Arc<dyn OnboardingRepository>,
    stubs: Stubs,
    timeout: Option<Duration>,
) -> Harness {
    let directory = Arc::new(StaticEmployeeDirectory::new().with_employee(employee()));
    let mut orchestrator = OnboardingOrchestrator::new(repository.clone(), directory, stubs.adapters());
    if let Some(timeout) = timeout {
        orchestrator = orchestrator.with_integration_timeout(timeout);
    }

    Harness {
        orchestrator: Arc::new(orchestrator),
        repository,
        stubs,
    }
}

pub fn employee_id() -> EmployeeId {
    EmployeeId::new(EMPLOYEE_ID)
}
