//! In-memory repository

use super::{OnboardingRepository, WorkflowFilter, WorkflowGuard, WorkflowLocks};
use crate::error::{OnboardingError, Result};
use async_trait::async_trait;
use onboarding_types::*;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// A keyed table behind a reader-writer lock
#[derive(Debug)]
struct Table<K, V> {
    kind: &'static str,
    rows: RwLock<HashMap<K, V>>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            rows: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned(&self) -> OnboardingError {
        OnboardingError::Persistence(format!("{} table lock poisoned", self.kind))
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.get(key).cloned())
    }

    fn insert_new(&self, key: &K, value: &V) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        if rows.contains_key(key) {
            return Err(OnboardingError::Persistence(format!("{} {} already exists", self.kind, key)));
        }
        rows.insert(key.clone(), value.clone());
        Ok(())
    }

    /// Insert a batch only when none of the keys exist yet
    fn insert_all(&self, entries: &[(K, V)]) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        if let Some((key, _)) = entries.iter().find(|(key, _)| rows.contains_key(key)) {
            return Err(OnboardingError::Persistence(format!("{} {} already exists", self.kind, key)));
        }
        for (key, value) in entries {
            rows.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn replace(&self, key: &K, value: &V) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        match rows.get_mut(key) {
            Some(row) => {
                *row = value.clone();
                Ok(())
            }
            None => Err(OnboardingError::not_found(self.kind, key)),
        }
    }

    fn retain(&self, keep: impl Fn(&V) -> bool) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        rows.retain(|_, v| keep(v));
        Ok(())
    }

    fn remove(&self, key: &K) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        rows.remove(key);
        Ok(())
    }

    fn select(&self, predicate: impl Fn(&V) -> bool) -> Result<Vec<V>> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows.values().filter(|v| predicate(v)).cloned().collect())
    }
}

/// Repository keeping everything in process memory
#[derive(Debug)]
pub struct MemoryRepository {
    workflows: Table<WorkflowId, Workflow>,
    steps: Table<StepId, Step>,
    integrations: Table<IntegrationId, IntegrationRecord>,
    exceptions: Table<ExceptionId, WorkflowException>,
    documents: Table<DocumentId, Document>,
    locks: WorkflowLocks,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            workflows: Table::new("workflow"),
            steps: Table::new("step"),
            integrations: Table::new("integration"),
            exceptions: Table::new("exception"),
            documents: Table::new("document"),
            locks: WorkflowLocks::new(),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OnboardingRepository for MemoryRepository {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<()> {
        self.workflows.insert_new(&workflow.id, workflow)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>> {
        self.workflows.get(id)
    }

    async fn update_workflow(&self, workflow: &Workflow) -> Result<()> {
        self.workflows.replace(&workflow.id, workflow)
    }

    async fn delete_workflow(&self, id: &WorkflowId) -> Result<()> {
        self.steps.retain(|step| &step.workflow_id != id)?;
        self.workflows.remove(id)
    }

    async fn list_workflows(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>> {
        let mut workflows = self.workflows.select(|w| filter.matches(w))?;
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(workflows)
    }

    async fn create_steps(&self, steps: &[Step]) -> Result<()> {
        let entries: Vec<(StepId, Step)> = steps.iter().map(|s| (s.id.clone(), s.clone())).collect();
        self.steps.insert_all(&entries)
    }

    async fn get_step(&self, id: &StepId) -> Result<Option<Step>> {
        self.steps.get(id)
    }

    async fn update_step(&self, step: &Step) -> Result<()> {
        self.steps.replace(&step.id, step)
    }

    async fn list_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<Step>> {
        let mut steps = self.steps.select(|s| &s.workflow_id == workflow_id)?;
        steps.sort_by_key(|s| s.order_index);
        Ok(steps)
    }

    async fn create_integration(&self, record: &IntegrationRecord) -> Result<()> {
        self.integrations.insert_new(&record.id, record)
    }

    async fn get_integration(&self, id: &IntegrationId) -> Result<Option<IntegrationRecord>> {
        self.integrations.get(id)
    }

    async fn update_integration(&self, record: &IntegrationRecord) -> Result<()> {
        self.integrations.replace(&record.id, record)
    }

    async fn list_integrations(&self, workflow_id: &WorkflowId) -> Result<Vec<IntegrationRecord>> {
        let mut records = self.integrations.select(|r| &r.workflow_id == workflow_id)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn list_integrations_by_status(&self, status: IntegrationStatus) -> Result<Vec<IntegrationRecord>> {
        let mut records = self.integrations.select(|r| r.status == status)?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn create_exception(&self, exception: &WorkflowException) -> Result<()> {
        self.exceptions.insert_new(&exception.id, exception)
    }

    async fn get_exception(&self, id: &ExceptionId) -> Result<Option<WorkflowException>> {
        self.exceptions.get(id)
    }

    async fn update_exception(&self, exception: &WorkflowException) -> Result<()> {
        self.exceptions.replace(&exception.id, exception)
    }

    async fn list_exceptions(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowException>> {
        let mut exceptions = self.exceptions.select(|e| &e.workflow_id == workflow_id)?;
        exceptions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(exceptions)
    }

    async fn create_documents(&self, documents: &[Document]) -> Result<()> {
        let entries: Vec<(DocumentId, Document)> =
            documents.iter().map(|d| (d.id.clone(), d.clone())).collect();
        self.documents.insert_all(&entries)
    }

    async fn list_documents(&self, workflow_id: &WorkflowId) -> Result<Vec<Document>> {
        let mut documents = self.documents.select(|d| &d.workflow_id == workflow_id)?;
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(documents)
    }

    async fn lock_workflow(&self, id: &WorkflowId) -> Result<WorkflowGuard> {
        self.locks.acquire(id).await
    }
}
