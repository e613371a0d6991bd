//! Workflow, step, integration, exception and document records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::*;
use crate::status::*;

/// Opaque key/value payload exchanged with integration providers
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One onboarding instance for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub employee_id: EmployeeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub template_name: String,
    pub status: WorkflowStatus,
    pub current_stage: Stage,
    pub overall_progress: u8,
    pub start_date: DateTime<Utc>,
    pub expected_completion_date: Option<DateTime<Utc>>,
    pub actual_completion_date: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create an active workflow positioned at the first stage with zero progress
    pub fn new(
        employee_id: EmployeeId,
        template_name: impl Into<String>,
        created_by: UserId,
        expected_completion_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: WorkflowId::new(),
            employee_id,
            template_id: None,
            template_name: template_name.into(),
            status: WorkflowStatus::InProgress,
            current_stage: Stage::first(),
            overall_progress: 0,
            start_date: now,
            expected_completion_date,
            actual_completion_date: None,
            created_by,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `stage`, applying its progress checkpoint.
    ///
    /// Progress never decreases. Entering `completed` also completes the
    /// workflow and stamps the actual completion date.
    pub fn enter_stage(&mut self, stage: Stage, now: DateTime<Utc>) {
        self.current_stage = stage;
        self.overall_progress = self.overall_progress.max(stage.progress_checkpoint());
        if stage == Stage::Completed {
            self.status = WorkflowStatus::Completed;
            self.actual_completion_date = Some(now);
        }
        self.updated_at = now;
    }

    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) {
        self.status = WorkflowStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }
}

/// A single checklist item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub workflow_id: WorkflowId,
    pub order_index: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub step_type: StepType,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<IntegrationType>,
    pub status: StepStatus,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<UserId>,
    pub skipped_by: Option<UserId>,
    pub skip_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Step {
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::Pending;
        self.updated_at = now;
    }

    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::InProgress;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, completed_by: UserId, now: DateTime<Utc>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(now);
        self.completed_by = Some(completed_by);
        self.updated_at = now;
    }

    pub fn mark_skipped(&mut self, skipped_by: UserId, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = StepStatus::Skipped;
        self.skipped_by = Some(skipped_by);
        self.skip_reason = Some(reason.into());
        self.updated_at = now;
    }
}

/// Audit and state record of one outbound integration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRecord {
    pub id: IntegrationId,
    pub workflow_id: WorkflowId,
    pub step_id: StepId,
    pub integration_type: IntegrationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub status: IntegrationStatus,
    #[serde(default)]
    pub request_payload: Payload,
    pub response_payload: Option<Payload>,
    pub error_message: Option<String>,
    pub external_id: Option<String>,
    pub max_retries: u32,
    pub retry_count: u32,
    /// Record created by an operator retry of this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retried_as: Option<IntegrationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl IntegrationRecord {
    pub fn new(
        workflow_id: WorkflowId,
        step_id: StepId,
        integration_type: IntegrationType,
        request_payload: Payload,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: IntegrationId::new(),
            workflow_id,
            step_id,
            integration_type,
            provider: None,
            status: IntegrationStatus::Pending,
            request_payload,
            response_payload: None,
            error_message: None,
            external_id: None,
            max_retries,
            retry_count: 0,
            retried_as: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn mark_in_progress(&mut self, now: DateTime<Utc>) {
        self.status = IntegrationStatus::InProgress;
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, response: Payload, external_id: Option<String>, now: DateTime<Utc>) {
        self.status = IntegrationStatus::Completed;
        self.response_payload = Some(response);
        self.external_id = external_id;
        self.error_message = None;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Record a failure. A completed record keeps its response and status.
    pub fn mark_failed(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        if self.status == IntegrationStatus::Completed {
            return;
        }
        let message = message.into();
        self.status = IntegrationStatus::Failed;
        self.error_message = Some(if message.is_empty() {
            "unknown integration error".to_string()
        } else {
            message
        });
        self.updated_at = now;
    }

    /// Whether an operator may re-trigger this record. Each failed record
    /// is retried at most once.
    pub fn can_retry(&self) -> bool {
        self.status == IntegrationStatus::Failed
            && self.retry_count < self.max_retries
            && self.retried_as.is_none()
    }
}

/// Durable flag that a workflow needs human attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowException {
    pub id: ExceptionId,
    pub workflow_id: WorkflowId,
    pub step_id: Option<StepId>,
    pub exception_type: ExceptionType,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub resolution_status: ResolutionStatus,
    pub resolved_by: Option<UserId>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowException {
    pub fn new(
        workflow_id: WorkflowId,
        step_id: Option<StepId>,
        exception_type: ExceptionType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExceptionId::new(),
            workflow_id,
            step_id,
            exception_type,
            severity,
            title: title.into(),
            description: description.into(),
            resolution_status: ResolutionStatus::Open,
            resolved_by: None,
            resolution_notes: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolution_status != ResolutionStatus::Resolved
    }

    /// Resolve once. Returns `false` and leaves the record untouched when it
    /// was already resolved.
    pub fn resolve(&mut self, resolved_by: UserId, notes: impl Into<String>, now: DateTime<Utc>) -> bool {
        if !self.is_open() {
            return false;
        }
        self.resolution_status = ResolutionStatus::Resolved;
        self.resolved_by = Some(resolved_by);
        self.resolution_notes = Some(notes.into());
        self.resolved_at = Some(now);
        self.updated_at = now;
        true
    }
}

/// Document located by the document-search provider and linked to a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub workflow_id: WorkflowId,
    pub step_id: StepId,
    pub integration_id: IntegrationId,
    pub name: String,
    pub document_type: String,
    pub storage_key: String,
    pub file_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub metadata: Payload,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> Workflow {
        Workflow::new(EmployeeId::new("emp-1"), "generic", UserId::new("hr-1"), None, Utc::now())
    }

    #[test]
    fn test_new_workflow_starts_in_pre_boarding() {
        let wf = workflow();
        assert_eq!(wf.status, WorkflowStatus::InProgress);
        assert_eq!(wf.current_stage, Stage::PreBoarding);
        assert_eq!(wf.overall_progress, 0);
        assert!(wf.actual_completion_date.is_none());
    }

    #[test]
    fn test_enter_completed_stage_finishes_workflow() {
        let mut wf = workflow();
        wf.enter_stage(Stage::Month1, Utc::now());
        assert_eq!(wf.overall_progress, 75);
        assert_eq!(wf.status, WorkflowStatus::InProgress);

        wf.enter_stage(Stage::Completed, Utc::now());
        assert_eq!(wf.overall_progress, 100);
        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert!(wf.actual_completion_date.is_some());
    }

    #[test]
    fn test_failed_integration_keeps_completed_response() {
        let mut record = IntegrationRecord::new(
            WorkflowId::new(),
            StepId::new(),
            IntegrationType::DocuSign,
            Payload::new(),
            3,
            Utc::now(),
        );
        let mut response = Payload::new();
        response.insert("envelope_id".into(), "env-1".into());
        record.mark_completed(response.clone(), Some("env-1".into()), Utc::now());
        record.mark_failed("late failure", Utc::now());

        assert_eq!(record.status, IntegrationStatus::Completed);
        assert_eq!(record.response_payload, Some(response));
        assert!(!record.can_retry());
    }

    #[test]
    fn test_failed_integration_always_has_message() {
        let mut record = IntegrationRecord::new(
            WorkflowId::new(),
            StepId::new(),
            IntegrationType::DocSearch,
            Payload::new(),
            3,
            Utc::now(),
        );
        record.mark_failed("", Utc::now());
        assert_eq!(record.status, IntegrationStatus::Failed);
        assert!(!record.error_message.as_deref().unwrap_or_default().is_empty());
        assert!(record.can_retry());

        record.retried_as = Some(IntegrationId::new());
        assert!(!record.can_retry());
    }

    #[test]
    fn test_exception_resolves_once() {
        let mut exception = WorkflowException::new(
            WorkflowId::new(),
            None,
            ExceptionType::SlaBreach,
            Severity::Medium,
            "Onboarding overdue",
            "",
            Utc::now(),
        );
        assert!(exception.resolve(UserId::new("hr-1"), "extended deadline", Utc::now()));
        assert!(!exception.resolve(UserId::new("hr-2"), "second attempt", Utc::now()));
        assert_eq!(exception.resolved_by, Some(UserId::new("hr-1")));
        assert_eq!(exception.resolution_notes.as_deref(), Some("extended deadline"));
    }
}
