//! Onboarding workflow orchestrator
//!
//! Owns the workflow, step and exception lifecycles and composes the
//! dependency resolver, the stage engine and the integration trigger.
//! Read-then-write sequences on one workflow run under the repository's
//! per-workflow lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::try_join_all;
use onboarding_types::*;
use serde::{Deserialize, Serialize};

use super::dependency::{release_blocked, unmet_dependencies};
use super::integration::{IntegrationAdapters, IntegrationTrigger};
use super::progress::ProgressSnapshot;
use super::stage::{force_advance, maybe_advance};
use super::templates::{generate_steps, template_for};
use super::traits::EmployeeDirectory;
use crate::error::{OnboardingError, Result};
use crate::store::{OnboardingRepository, WorkflowFilter};
use crate::types::{BackgroundCheckParams, DocSearchParams, DocuSignParams};

/// A workflow with its steps ordered by `order_index`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDetails {
    pub workflow: Workflow,
    pub steps: Vec<Step>,
}

/// Input of a manually raised exception
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaiseExceptionRequest {
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub step_id: Option<StepId>,
    pub exception_type: ExceptionType,
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub struct OnboardingOrchestrator {
    repository: Arc<dyn OnboardingRepository>,
    employees: Arc<dyn EmployeeDirectory>,
    integrations: IntegrationTrigger,
}

impl OnboardingOrchestrator {
    pub fn new(
        repository: Arc<dyn OnboardingRepository>,
        employees: Arc<dyn EmployeeDirectory>,
        adapters: IntegrationAdapters,
    ) -> Self {
        let integrations = IntegrationTrigger::new(repository.clone(), employees.clone(), adapters);
        Self {
            repository,
            employees,
            integrations,
        }
    }

    /// Deadline applied to every adapter call
    pub fn with_integration_timeout(mut self, timeout: Duration) -> Self {
        self.integrations = self.integrations.with_timeout(timeout);
        self
    }

    pub fn with_doc_search_limit(mut self, limit: u32) -> Self {
        self.integrations = self.integrations.with_doc_search_limit(limit);
        self
    }

    pub fn background_check_providers(&self) -> Vec<&str> {
        self.integrations.background_providers().names()
    }

    // Workflow lifecycle

    /// Create a workflow for an existing employee and generate its steps.
    ///
    /// If the steps cannot be stored the workflow is deleted again before the
    /// error is returned.
    pub async fn initiate_workflow(
        &self,
        employee_id: &EmployeeId,
        template_name: &str,
        created_by: UserId,
    ) -> Result<WorkflowDetails> {
        let employee = self
            .employees
            .get_by_id(employee_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("employee", employee_id))?;

        let template = template_for(template_name);
        let now = Utc::now();
        let expected = now + chrono::Duration::days(template.expected_duration_days);

        let mut workflow = Workflow::new(employee.id.clone(), template_name, created_by, Some(expected), now);
        workflow.template_id = Some(template.name.to_string());
        self.repository.create_workflow(&workflow).await?;

        let steps = generate_steps(&workflow.id, template, now);
        if let Err(e) = self.repository.create_steps(&steps).await {
            log::error!("Failed to create steps for workflow {}: {}", workflow.id, e);
            if let Err(cleanup) = self.repository.delete_workflow(&workflow.id).await {
                log::error!("Failed to remove partially created workflow {}: {}", workflow.id, cleanup);
            }
            return Err(e);
        }

        log::info!(
            "Initiated workflow {} for employee {} ({}) from template '{}' with {} steps",
            workflow.id,
            employee.id,
            employee.full_name(),
            template.name,
            steps.len()
        );

        Ok(WorkflowDetails { workflow, steps })
    }

    /// Cancel a workflow. Steps and in-flight integrations are left alone.
    pub async fn cancel_workflow(&self, workflow_id: &WorkflowId) -> Result<Workflow> {
        let _guard = self.repository.lock_workflow(workflow_id).await?;
        let mut workflow = self.load_workflow(workflow_id).await?;

        if workflow.is_terminal() {
            return Err(OnboardingError::InvalidTransition(format!(
                "workflow {} is already {}",
                workflow.id, workflow.status
            )));
        }

        workflow.mark_cancelled(Utc::now());
        self.repository.update_workflow(&workflow).await?;
        log::info!("Cancelled workflow {} at stage {}", workflow.id, workflow.current_stage);
        Ok(workflow)
    }

    /// Manual override moving the workflow one stage forward. Stages after
    /// that one which are already finished are passed through as usual.
    pub async fn advance_stage(&self, workflow_id: &WorkflowId) -> Result<Workflow> {
        let _guard = self.repository.lock_workflow(workflow_id).await?;
        let mut workflow = self.load_workflow(workflow_id).await?;
        let mut steps = self.repository.list_steps(workflow_id).await?;

        let now = Utc::now();
        force_advance(&mut workflow, now)?;
        maybe_advance(&mut workflow, &steps, now);
        self.repository.update_workflow(&workflow).await?;

        if !workflow.is_terminal() {
            self.release_steps(&mut steps, workflow.current_stage).await?;
        }
        Ok(workflow)
    }

    // Step lifecycle

    /// Start a step once every dependency is completed or skipped
    pub async fn start_step(&self, step_id: &StepId) -> Result<Step> {
        let workflow_id = self.load_step(step_id).await?.workflow_id;
        let _guard = self.repository.lock_workflow(&workflow_id).await?;

        let mut step = self.load_step(step_id).await?;
        if !matches!(step.status, StepStatus::Pending | StepStatus::Blocked | StepStatus::Failed) {
            return Err(OnboardingError::InvalidTransition(format!(
                "step {} is {} and cannot be started",
                step.id, step.status
            )));
        }

        let steps = self.repository.list_steps(&workflow_id).await?;
        let unmet = unmet_dependencies(&step, &steps);
        if !unmet.is_empty() {
            log::info!("Step {} not started, {} dependencies unmet", step.id, unmet.len());
            return Err(OnboardingError::DependencyNotMet {
                step_id: step.id.clone(),
                unmet,
            });
        }

        step.mark_started(Utc::now());
        self.repository.update_step(&step).await?;
        log::info!("Started step {} '{}' of workflow {}", step.id, step.name, workflow_id);
        Ok(step)
    }

    /// Complete a step and check whether its workflow's stage is done
    pub async fn complete_step(&self, step_id: &StepId, completed_by: UserId) -> Result<Step> {
        self.finish_step(step_id, |step, now| {
            log::info!("Completing step {} by {}", step.id, completed_by);
            step.mark_completed(completed_by, now);
        })
        .await
    }

    /// Skip a step; skipped steps count as done for dependencies and stages
    pub async fn skip_step(&self, step_id: &StepId, skipped_by: UserId, reason: &str) -> Result<Step> {
        self.finish_step(step_id, |step, now| {
            log::info!("Skipping step {} by {}: {}", step.id, skipped_by, reason);
            step.mark_skipped(skipped_by, reason, now);
        })
        .await
    }

    async fn finish_step(&self, step_id: &StepId, finish: impl FnOnce(&mut Step, chrono::DateTime<Utc>)) -> Result<Step> {
        let workflow_id = self.load_step(step_id).await?.workflow_id;
        let _guard = self.repository.lock_workflow(&workflow_id).await?;

        let mut step = self.load_step(step_id).await?;
        if step.is_finished() {
            return Err(OnboardingError::InvalidTransition(format!(
                "step {} is already {}",
                step.id, step.status
            )));
        }

        finish(&mut step, Utc::now());
        self.repository.update_step(&step).await?;
        self.after_step_finished(&workflow_id).await?;
        Ok(step)
    }

    /// Advance the stage if it is done and release newly unblocked steps
    async fn after_step_finished(&self, workflow_id: &WorkflowId) -> Result<()> {
        let mut workflow = self.load_workflow(workflow_id).await?;
        if workflow.is_terminal() {
            log::debug!("Workflow {} is {}, skipping stage check", workflow.id, workflow.status);
            return Ok(());
        }

        let mut steps = self.repository.list_steps(workflow_id).await?;
        if maybe_advance(&mut workflow, &steps, Utc::now()).advanced() {
            self.repository.update_workflow(&workflow).await?;
        }

        if !workflow.is_terminal() {
            self.release_steps(&mut steps, workflow.current_stage).await?;
        }
        Ok(())
    }

    async fn release_steps(&self, steps: &mut [Step], stage: Stage) -> Result<()> {
        let released = release_blocked(steps, stage, Utc::now());
        if released.is_empty() {
            return Ok(());
        }

        try_join_all(released.iter().map(|step| self.repository.update_step(step))).await?;
        log::info!("Released {} blocked steps in stage {}", released.len(), stage);
        Ok(())
    }

    // Integrations

    pub async fn trigger_docusign(&self, step_id: &StepId, params: DocuSignParams) -> Result<IntegrationRecord> {
        self.integrations.trigger_docusign(step_id, params).await
    }

    pub async fn trigger_background_check(
        &self,
        step_id: &StepId,
        params: BackgroundCheckParams,
    ) -> Result<IntegrationRecord> {
        self.integrations.trigger_background_check(step_id, params).await
    }

    pub async fn trigger_doc_search(&self, step_id: &StepId, params: DocSearchParams) -> Result<IntegrationRecord> {
        self.integrations.trigger_doc_search(step_id, params).await
    }

    /// Operator retry of a failed integration record
    pub async fn retry_integration(&self, integration_id: &IntegrationId) -> Result<IntegrationRecord> {
        self.integrations.retry(integration_id).await
    }

    // Exceptions

    pub async fn raise_exception(&self, request: RaiseExceptionRequest) -> Result<WorkflowException> {
        self.load_workflow(&request.workflow_id).await?;

        if let Some(step_id) = &request.step_id {
            let step = self.load_step(step_id).await?;
            if step.workflow_id != request.workflow_id {
                return Err(OnboardingError::Validation(format!(
                    "step {} does not belong to workflow {}",
                    step_id, request.workflow_id
                )));
            }
        }

        if request.title.trim().is_empty() {
            return Err(OnboardingError::Validation("exception title is required".to_string()));
        }

        let exception = WorkflowException::new(
            request.workflow_id,
            request.step_id,
            request.exception_type,
            request.severity,
            request.title,
            request.description,
            Utc::now(),
        );
        self.repository.create_exception(&exception).await?;
        log::warn!(
            "Raised {} exception {} ({}) on workflow {}",
            exception.exception_type,
            exception.id,
            exception.severity,
            exception.workflow_id
        );
        Ok(exception)
    }

    /// Resolve an exception. Resolving twice keeps the first resolution.
    pub async fn resolve_exception(
        &self,
        exception_id: &ExceptionId,
        resolved_by: UserId,
        notes: &str,
    ) -> Result<WorkflowException> {
        let workflow_id = self.load_exception(exception_id).await?.workflow_id;
        let _guard = self.repository.lock_workflow(&workflow_id).await?;

        let mut exception = self.load_exception(exception_id).await?;
        if exception.resolve(resolved_by, notes, Utc::now()) {
            self.repository.update_exception(&exception).await?;
            log::info!("Resolved exception {} on workflow {}", exception.id, exception.workflow_id);
        } else {
            log::info!("Exception {} already resolved", exception.id);
        }
        Ok(exception)
    }

    // Queries

    pub async fn check_workflow_progress(&self, workflow_id: &WorkflowId) -> Result<ProgressSnapshot> {
        let workflow = self.load_workflow(workflow_id).await?;
        let steps = self.repository.list_steps(workflow_id).await?;
        let exceptions = self.repository.list_exceptions(workflow_id).await?;
        Ok(ProgressSnapshot::compute(&workflow, &steps, &exceptions, Utc::now()))
    }

    pub async fn get_workflow(&self, workflow_id: &WorkflowId) -> Result<WorkflowDetails> {
        let workflow = self.load_workflow(workflow_id).await?;
        let steps = self.repository.list_steps(workflow_id).await?;
        Ok(WorkflowDetails { workflow, steps })
    }

    pub async fn list_workflows(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>> {
        self.repository.list_workflows(filter).await
    }

    pub async fn list_exceptions(&self, workflow_id: &WorkflowId, open_only: bool) -> Result<Vec<WorkflowException>> {
        self.load_workflow(workflow_id).await?;
        let exceptions = self.repository.list_exceptions(workflow_id).await?;
        Ok(exceptions.into_iter().filter(|e| !open_only || e.is_open()).collect())
    }

    pub async fn list_integrations(&self, workflow_id: &WorkflowId) -> Result<Vec<IntegrationRecord>> {
        self.load_workflow(workflow_id).await?;
        self.repository.list_integrations(workflow_id).await
    }

    /// Failed integration records across all workflows that may still be retried
    pub async fn retryable_integrations(&self) -> Result<Vec<IntegrationRecord>> {
        let failed = self.repository.list_integrations_by_status(IntegrationStatus::Failed).await?;
        Ok(failed.into_iter().filter(IntegrationRecord::can_retry).collect())
    }

    pub async fn list_documents(&self, workflow_id: &WorkflowId) -> Result<Vec<Document>> {
        self.load_workflow(workflow_id).await?;
        self.repository.list_documents(workflow_id).await
    }

    async fn load_workflow(&self, workflow_id: &WorkflowId) -> Result<Workflow> {
        self.repository
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("workflow", workflow_id))
    }

    async fn load_exception(&self, exception_id: &ExceptionId) -> Result<WorkflowException> {
        self.repository
            .get_exception(exception_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("exception", exception_id))
    }

    async fn load_step(&self, step_id: &StepId) -> Result<Step> {
        self.repository
            .get_step(step_id)
            .await?
            .ok_or_else(|| OnboardingError::not_found("step", step_id))
    }
}
