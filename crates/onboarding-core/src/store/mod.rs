//! Onboarding persistence
//!
//! The engine talks to storage only through [`OnboardingRepository`]. Every
//! call is expected to be consistent on its own; multi-call sequences that
//! read steps and then advance a stage are serialized per workflow through
//! [`OnboardingRepository::lock_workflow`].

pub mod file;
pub mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

use crate::error::{OnboardingError, Result};
use async_trait::async_trait;
use file::FileLock;
use onboarding_types::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type LockTable = Arc<Mutex<HashMap<WorkflowId, Arc<tokio::sync::Mutex<()>>>>>;

/// Workflow list filter; empty matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowFilter {
    pub status: Option<WorkflowStatus>,
    pub employee_id: Option<EmployeeId>,
}

impl WorkflowFilter {
    pub fn with_status(status: WorkflowStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn for_employee(employee_id: EmployeeId) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, workflow: &Workflow) -> bool {
        self.status.map_or(true, |s| workflow.status == s)
            && self
                .employee_id
                .as_ref()
                .map_or(true, |e| &workflow.employee_id == e)
    }
}

/// Storage of workflows, steps, integration records, exceptions and documents
#[async_trait]
pub trait OnboardingRepository: Send + Sync {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<()>;

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>>;

    async fn update_workflow(&self, workflow: &Workflow) -> Result<()>;

    /// Remove a workflow together with its steps
    async fn delete_workflow(&self, id: &WorkflowId) -> Result<()>;

    async fn list_workflows(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>>;

    /// Create all steps or none
    async fn create_steps(&self, steps: &[Step]) -> Result<()>;

    async fn get_step(&self, id: &StepId) -> Result<Option<Step>>;

    async fn update_step(&self, step: &Step) -> Result<()>;

    /// Steps of a workflow ordered by `order_index`
    async fn list_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<Step>>;

    async fn create_integration(&self, record: &IntegrationRecord) -> Result<()>;

    async fn get_integration(&self, id: &IntegrationId) -> Result<Option<IntegrationRecord>>;

    async fn update_integration(&self, record: &IntegrationRecord) -> Result<()>;

    async fn list_integrations(&self, workflow_id: &WorkflowId) -> Result<Vec<IntegrationRecord>>;

    async fn list_integrations_by_status(&self, status: IntegrationStatus) -> Result<Vec<IntegrationRecord>>;

    async fn create_exception(&self, exception: &WorkflowException) -> Result<()>;

    async fn get_exception(&self, id: &ExceptionId) -> Result<Option<WorkflowException>>;

    async fn update_exception(&self, exception: &WorkflowException) -> Result<()>;

    async fn list_exceptions(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowException>>;

    async fn create_documents(&self, documents: &[Document]) -> Result<()>;

    async fn list_documents(&self, workflow_id: &WorkflowId) -> Result<Vec<Document>>;

    /// Acquire the per-workflow mutual exclusion guard
    async fn lock_workflow(&self, id: &WorkflowId) -> Result<WorkflowGuard>;
}

/// One async mutex per workflow, created on first use and dropped again
/// when its last guard is released
#[derive(Debug, Default)]
pub struct WorkflowLocks {
    locks: LockTable,
}

impl WorkflowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: &WorkflowId) -> Result<WorkflowGuard> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| OnboardingError::Persistence("workflow lock table poisoned".to_string()))?;
            locks.entry(id.clone()).or_default().clone()
        };

        Ok(WorkflowGuard {
            id: id.clone(),
            table: self.locks.clone(),
            held: Some(lock.lock_owned().await),
            file_lock: None,
        })
    }

    /// Number of workflows currently holding or waiting on a lock
    pub fn tracked_workflows(&self) -> usize {
        self.locks.lock().map_or(0, |locks| locks.len())
    }
}

/// Held while a workflow's read-then-write sequence runs
pub struct WorkflowGuard {
    id: WorkflowId,
    table: LockTable,
    held: Option<tokio::sync::OwnedMutexGuard<()>>,
    file_lock: Option<FileLock>,
}

impl WorkflowGuard {
    /// Also hold a cross-process lock until this guard is dropped
    pub(crate) fn with_file_lock(mut self, lock: FileLock) -> Self {
        self.file_lock = Some(lock);
        self
    }
}

impl Drop for WorkflowGuard {
    fn drop(&mut self) {
        self.file_lock.take();
        self.held.take();

        // Entries are only cloned under the table lock, so a count of one
        // means nobody else holds or waits on this workflow.
        if let Ok(mut locks) = self.table.lock() {
            let idle = locks.get(&self.id).map_or(false, |lock| Arc::strong_count(lock) == 1);
            if idle {
                locks.remove(&self.id);
            }
        }
    }
}
