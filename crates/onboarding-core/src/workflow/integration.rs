//! Integration trigger subsystem
//!
//! Every trigger persists an audit record before calling its adapter, calls
//! the adapter under a deadline, and records the outcome. A failed call marks
//! the record failed, raises a high-severity `integration_failure` exception
//! and returns the error. Nothing is retried automatically; operators retry
//! failed records explicitly while they are under their retry ceiling.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use onboarding_types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::traits::{BackgroundCheckClient, DocumentSearchClient, DocumentSigningClient, EmployeeDirectory};
use crate::clients::BackgroundCheckProviders;
use crate::constants::{DEFAULT_DOC_SEARCH_LIMIT, DEFAULT_INTEGRATION_TIMEOUT_SECS, INTEGRATION_MAX_RETRIES};
use crate::error::{OnboardingError, Result};
use crate::store::OnboardingRepository;
use crate::types::*;

/// The three external adapters used by integration steps
#[derive(Clone)]
pub struct IntegrationAdapters {
    pub docusign: Arc<dyn DocumentSigningClient>,
    pub background_checks: BackgroundCheckProviders,
    pub doc_search: Arc<dyn DocumentSearchClient>,
}

/// One prepared adapter call
enum AdapterCall {
    DocuSign(EnvelopeRequest),
    BackgroundCheck {
        provider: String,
        client: Arc<dyn BackgroundCheckClient>,
        request: BackgroundCheckRequest,
    },
    DocSearch(DocumentSearchRequest),
}

impl AdapterCall {
    fn integration_type(&self) -> IntegrationType {
        match self {
            Self::DocuSign(_) => IntegrationType::DocuSign,
            Self::BackgroundCheck { .. } => IntegrationType::BackgroundCheck,
            Self::DocSearch(_) => IntegrationType::DocSearch,
        }
    }

    fn provider(&self) -> Option<String> {
        match self {
            Self::BackgroundCheck { provider, .. } => Some(provider.clone()),
            _ => None,
        }
    }

    fn request_payload(&self) -> Result<Payload> {
        match self {
            Self::DocuSign(request) => to_payload(request),
            Self::BackgroundCheck { request, .. } => to_payload(request),
            Self::DocSearch(request) => to_payload(request),
        }
    }
}

struct AdapterOutcome {
    response: Payload,
    external_id: Option<String>,
    documents: Vec<FoundDocument>,
}

pub struct IntegrationTrigger {
    repository: Arc<dyn OnboardingRepository>,
    employees: Arc<dyn EmployeeDirectory>,
    adapters: IntegrationAdapters,
    timeout: Duration,
    doc_search_limit: u32,
}

impl IntegrationTrigger {
    pub fn new(
        repository: Arc<dyn OnboardingRepository>,
        employees: Arc<dyn EmployeeDirectory>,
        adapters: IntegrationAdapters,
    ) -> Self {
        Self {
            repository,
            employees,
            adapters,
            timeout: Duration::from_secs(DEFAULT_INTEGRATION_TIMEOUT_SECS),
            doc_search_limit: DEFAULT_DOC_SEARCH_LIMIT,
        }
    }

    /// Deadline applied to every adapter call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Result limit used when a document search does not specify one
    pub fn with_doc_search_limit(mut self, limit: u32) -> Self {
        self.doc_search_limit = limit;
        self
    }

    pub fn background_providers(&self) -> &BackgroundCheckProviders {
        &self.adapters.background_checks
    }

    /// Send a document for signature to the step's employee
    pub async fn trigger_docusign(&self, step_id: &StepId, params: DocuSignParams) -> Result<IntegrationRecord> {
        let step = self.load_step(step_id).await?;
        let employee = self.load_employee(&step).await?;

        let request = EnvelopeRequest {
            document_type: params.document_type,
            signer_email: employee.email.clone(),
            signer_name: employee.full_name(),
            employee_id: employee.id.clone(),
        };

        self.execute(&step, AdapterCall::DocuSign(request), 0).await
    }

    /// Start a background check with the named provider, or the default one
    pub async fn trigger_background_check(
        &self,
        step_id: &StepId,
        params: BackgroundCheckParams,
    ) -> Result<IntegrationRecord> {
        let step = self.load_step(step_id).await?;
        let (provider, client) = self.adapters.background_checks.resolve(params.provider.as_deref())?;
        let employee = self.load_employee(&step).await?;

        let request = BackgroundCheckRequest {
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            check_types: params.check_types,
            employee_id: employee.id.clone(),
        };

        self.execute(
            &step,
            AdapterCall::BackgroundCheck {
                provider,
                client,
                request,
            },
            0,
        )
        .await
    }

    /// Search for documents and link every hit to the step
    pub async fn trigger_doc_search(&self, step_id: &StepId, params: DocSearchParams) -> Result<IntegrationRecord> {
        let step = self.load_step(step_id).await?;

        let request = DocumentSearchRequest {
            query: params.query,
            limit: params.limit.unwrap_or(self.doc_search_limit),
        };

        self.execute(&step, AdapterCall::DocSearch(request), 0).await
    }

    /// Re-send the stored request of a failed record as a new record
    pub async fn retry(&self, integration_id: &IntegrationId) -> Result<IntegrationRecord> {
        let mut previous = self
            .repository
            .get_integration(integration_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("integration", integration_id))?;

        if previous.status != IntegrationStatus::Failed {
            return Err(OnboardingError::InvalidTransition(format!(
                "integration {} is {}; only failed integrations can be retried",
                previous.id, previous.status
            )));
        }
        if let Some(successor) = &previous.retried_as {
            return Err(OnboardingError::InvalidTransition(format!(
                "integration {} was already retried as {}",
                previous.id, successor
            )));
        }
        if !previous.can_retry() {
            return Err(OnboardingError::InvalidTransition(format!(
                "integration {} has used {} of {} retries",
                previous.id, previous.retry_count, previous.max_retries
            )));
        }

        let call = match previous.integration_type {
            IntegrationType::DocuSign => AdapterCall::DocuSign(from_payload(&previous.request_payload)?),
            IntegrationType::BackgroundCheck => {
                let (provider, client) = self.adapters.background_checks.resolve(previous.provider.as_deref())?;
                AdapterCall::BackgroundCheck {
                    provider,
                    client,
                    request: from_payload(&previous.request_payload)?,
                }
            }
            IntegrationType::DocSearch => AdapterCall::DocSearch(from_payload(&previous.request_payload)?),
        };

        let step = self.load_step(&previous.step_id).await?;
        let record = self.open_record(&step, &call, previous.retry_count + 1).await?;

        previous.retried_as = Some(record.id.clone());
        previous.updated_at = Utc::now();
        self.repository.update_integration(&previous).await?;

        log::info!(
            "Retrying integration {} as {} ({}) attempt {}/{}",
            previous.id,
            record.id,
            previous.integration_type,
            record.retry_count,
            previous.max_retries
        );
        self.run(record, call).await
    }

    async fn load_step(&self, step_id: &StepId) -> Result<Step> {
        let step = self
            .repository
            .get_step(step_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("step", step_id))?;

        if self.repository.get_workflow(&step.workflow_id).await?.is_none() {
            return Err(OnboardingError::not_found("workflow", &step.workflow_id));
        }
        Ok(step)
    }

    async fn load_employee(&self, step: &Step) -> Result<Employee> {
        let workflow = self
            .repository
            .get_workflow(&step.workflow_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("workflow", &step.workflow_id))?;

        self.employees
            .get_by_id(&workflow.employee_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("employee", &workflow.employee_id))
    }

    async fn execute(&self, step: &Step, call: AdapterCall, retry_count: u32) -> Result<IntegrationRecord> {
        let record = self.open_record(step, &call, retry_count).await?;
        self.run(record, call).await
    }

    /// Persist a pending record for `call`
    async fn open_record(&self, step: &Step, call: &AdapterCall, retry_count: u32) -> Result<IntegrationRecord> {
        let mut record = IntegrationRecord::new(
            step.workflow_id.clone(),
            step.id.clone(),
            call.integration_type(),
            call.request_payload()?,
            INTEGRATION_MAX_RETRIES,
            Utc::now(),
        );
        record.provider = call.provider();
        record.retry_count = retry_count;
        self.repository.create_integration(&record).await?;

        log::info!(
            "Triggering {} integration {} for step {} of workflow {}",
            record.integration_type,
            record.id,
            step.id,
            step.workflow_id
        );
        Ok(record)
    }

    /// Call the adapter for an open record and store the outcome
    async fn run(&self, mut record: IntegrationRecord, call: AdapterCall) -> Result<IntegrationRecord> {
        let integration = record.integration_type;

        record.mark_in_progress(Utc::now());
        self.repository.update_integration(&record).await?;

        match self.invoke(call).await {
            Ok(outcome) => {
                record.mark_completed(outcome.response, outcome.external_id, Utc::now());
                self.repository.update_integration(&record).await?;

                if !outcome.documents.is_empty() {
                    self.materialize_documents(&record, outcome.documents).await?;
                }

                log::info!("Integration {} ({}) completed", record.id, integration);
                Ok(record)
            }
            Err(e) => {
                record.mark_failed(failure_message(&e), Utc::now());
                self.repository.update_integration(&record).await?;

                let message = record.error_message.clone().unwrap_or_default();
                log::error!("Integration {} ({}) failed: {}", record.id, integration, message);

                self.raise_failure_exception(&record, &message).await?;
                Err(OnboardingError::IntegrationFailure { integration, message })
            }
        }
    }

    /// Call the adapter under the configured deadline
    async fn invoke(&self, call: AdapterCall) -> Result<AdapterOutcome> {
        let integration = call.integration_type();
        match tokio::time::timeout(self.timeout, self.call_adapter(call)).await {
            Ok(result) => result,
            Err(_) => Err(OnboardingError::IntegrationFailure {
                integration,
                message: format!("integration timed out after {:?}", self.timeout),
            }),
        }
    }

    async fn call_adapter(&self, call: AdapterCall) -> Result<AdapterOutcome> {
        match call {
            AdapterCall::DocuSign(request) => {
                let response = self.adapters.docusign.send_envelope(&request).await?;
                Ok(AdapterOutcome {
                    external_id: Some(response.envelope_id.clone()),
                    response: to_payload(&response)?,
                    documents: Vec::new(),
                })
            }
            AdapterCall::BackgroundCheck { client, request, .. } => {
                let response = client.initiate_check(&request).await?;
                Ok(AdapterOutcome {
                    external_id: Some(response.check_id.clone()),
                    response: to_payload(&response)?,
                    documents: Vec::new(),
                })
            }
            AdapterCall::DocSearch(request) => {
                let response = self.adapters.doc_search.search_documents(&request).await?;
                Ok(AdapterOutcome {
                    external_id: None,
                    response: to_payload(&response)?,
                    documents: response.documents,
                })
            }
        }
    }

    async fn materialize_documents(&self, record: &IntegrationRecord, found: Vec<FoundDocument>) -> Result<()> {
        let now = Utc::now();
        let documents: Vec<Document> = found
            .into_iter()
            .map(|doc| Document {
                id: DocumentId::new(),
                workflow_id: record.workflow_id.clone(),
                step_id: record.step_id.clone(),
                integration_id: record.id.clone(),
                name: doc.name,
                document_type: doc.document_type,
                storage_key: doc.storage_key,
                file_type: doc.file_type,
                size_bytes: doc.size,
                metadata: doc.metadata,
                created_at: now,
            })
            .collect();

        self.repository.create_documents(&documents).await?;
        log::info!(
            "Linked {} documents from integration {} to step {}",
            documents.len(),
            record.id,
            record.step_id
        );
        Ok(())
    }

    async fn raise_failure_exception(&self, record: &IntegrationRecord, message: &str) -> Result<()> {
        let exception = WorkflowException::new(
            record.workflow_id.clone(),
            Some(record.step_id.clone()),
            ExceptionType::IntegrationFailure,
            Severity::High,
            format!("{} integration failed", record.integration_type),
            message,
            Utc::now(),
        );
        self.repository.create_exception(&exception).await?;
        log::warn!(
            "Raised exception {} for failed integration {} on workflow {}",
            exception.id,
            record.id,
            record.workflow_id
        );
        Ok(())
    }
}

/// Adapter error text without the error-kind prefix
fn failure_message(err: &OnboardingError) -> String {
    match err {
        OnboardingError::IntegrationFailure { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<Payload> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(OnboardingError::Validation(format!(
            "integration payload must be a JSON object, got {}",
            other
        ))),
    }
}

fn from_payload<T: DeserializeOwned>(payload: &Payload) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(payload.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message_strips_kind() {
        let err = OnboardingError::IntegrationFailure {
            integration: IntegrationType::BackgroundCheck,
            message: "service unavailable".to_string(),
        };
        assert_eq!(failure_message(&err), "service unavailable");

        let err = OnboardingError::Validation("bad".to_string());
        assert_eq!(failure_message(&err), "Validation failed: bad");
    }

    #[test]
    fn test_request_payload_roundtrip() {
        let request = DocumentSearchRequest {
            query: "handbook".to_string(),
            limit: 5,
        };
        let payload = to_payload(&request).unwrap();
        assert_eq!(payload.get("query"), Some(&Value::from("handbook")));

        let back: DocumentSearchRequest = from_payload(&payload).unwrap();
        assert_eq!(back, request);
    }
}
