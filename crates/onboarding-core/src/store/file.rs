//! File-backed repository
//!
//! One pretty-printed JSON document per entity, grouped in per-kind
//! directories under a data root. Writes go to a temporary file first and are
//! renamed into place.
//!
//! Several processes may share a data root. `lock_workflow` takes an
//! exclusive advisory lock on `locks/<workflow>.lock` in addition to the
//! in-process mutex.

use super::{OnboardingRepository, WorkflowFilter, WorkflowGuard, WorkflowLocks};
use crate::error::{OnboardingError, Result};
use crate::paths;
use async_trait::async_trait;
use fd_lock::RwLock;
use onboarding_types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a lock file, held until dropped
pub(crate) struct FileLock {
    _file: RwLock<File>,
}

impl FileLock {
    /// Block until the lock on `path` is ours
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|e| io_error(path, e))?;

        let mut lock = RwLock::new(file);
        let guard = lock.write().map_err(|e| io_error(path, e))?;
        // Closing the descriptor releases the lock
        std::mem::forget(guard);

        Ok(Self { _file: lock })
    }
}

pub struct FileRepository {
    root_path: PathBuf,
    locks: WorkflowLocks,
}

impl FileRepository {
    /// Open (and lay out) a repository rooted at `root_path`
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        for dir in paths::ENTITY_DIR_NAMES {
            fs::create_dir_all(root_path.join(dir))?;
        }
        fs::create_dir_all(paths::locks_dir(&root_path))?;

        Ok(Self {
            root_path,
            locks: WorkflowLocks::new(),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn entity_path(dir: &Path, id: &str) -> PathBuf {
        dir.join(paths::entity_file_name(id))
    }

    fn write_entity<T: Serialize>(&self, path: &Path, entity: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(entity)
            .map_err(|e| OnboardingError::Persistence(format!("Failed to serialize {}: {}", path.display(), e)))?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| io_error(path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| io_error(path, e))?;
        Ok(())
    }

    fn read_entity<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| OnboardingError::Persistence(format!("Failed to deserialize {}: {}", path.display(), e)))
    }

    fn create_entity<T: Serialize>(&self, dir: &Path, id: &str, entity: &T) -> Result<()> {
        let path = Self::entity_path(dir, id);
        if path.exists() {
            return Err(OnboardingError::Persistence(format!("{} already exists", path.display())));
        }
        self.write_entity(&path, entity)
    }

    fn replace_entity<T: Serialize>(&self, dir: &Path, kind: &str, id: &str, entity: &T) -> Result<()> {
        let path = Self::entity_path(dir, id);
        if !path.exists() {
            return Err(OnboardingError::not_found(kind, id));
        }
        self.write_entity(&path, entity)
    }

    /// Write a batch of new entities, removing the ones already written if any write fails
    fn create_batch<T: Serialize>(&self, dir: &Path, entities: &[(String, &T)]) -> Result<()> {
        let mut written: Vec<PathBuf> = Vec::with_capacity(entities.len());

        for (id, entity) in entities {
            if let Err(e) = self.create_entity(dir, id, *entity) {
                for path in &written {
                    if let Err(cleanup) = fs::remove_file(path) {
                        log::error!("Failed to roll back {}: {}", path.display(), cleanup);
                    }
                }
                return Err(e);
            }
            written.push(Self::entity_path(dir, id));
        }

        Ok(())
    }

    /// Load every entity of a directory that satisfies `predicate`. Any
    /// unreadable file fails the whole listing.
    fn list_entities<T: DeserializeOwned>(&self, dir: &Path, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entities = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match self.read_entity::<T>(&path) {
                Ok(Some(entity)) if predicate(&entity) => entities.push(entity),
                Ok(_) => {}
                Err(e) => {
                    log::error!("Unreadable entity file in {}: {}", dir.display(), e);
                    return Err(e);
                }
            }
        }

        Ok(entities)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> OnboardingError {
    OnboardingError::Persistence(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl OnboardingRepository for FileRepository {
    async fn create_workflow(&self, workflow: &Workflow) -> Result<()> {
        self.create_entity(&paths::workflows_dir(&self.root_path), workflow.id.as_str(), workflow)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>> {
        self.read_entity(&Self::entity_path(&paths::workflows_dir(&self.root_path), id.as_str()))
    }

    async fn update_workflow(&self, workflow: &Workflow) -> Result<()> {
        self.replace_entity(
            &paths::workflows_dir(&self.root_path),
            "workflow",
            workflow.id.as_str(),
            workflow,
        )
    }

    async fn delete_workflow(&self, id: &WorkflowId) -> Result<()> {
        for step in self.list_steps(id).await? {
            let path = Self::entity_path(&paths::steps_dir(&self.root_path), step.id.as_str());
            fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
        }

        let path = Self::entity_path(&paths::workflows_dir(&self.root_path), id.as_str());
        if path.exists() {
            fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
        }
        Ok(())
    }

    async fn list_workflows(&self, filter: &WorkflowFilter) -> Result<Vec<Workflow>> {
        let mut workflows =
            self.list_entities(&paths::workflows_dir(&self.root_path), |w: &Workflow| filter.matches(w))?;
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(workflows)
    }

    async fn create_steps(&self, steps: &[Step]) -> Result<()> {
        let entries: Vec<(String, &Step)> = steps.iter().map(|s| (s.id.to_string(), s)).collect();
        self.create_batch(&paths::steps_dir(&self.root_path), &entries)
    }

    async fn get_step(&self, id: &StepId) -> Result<Option<Step>> {
        self.read_entity(&Self::entity_path(&paths::steps_dir(&self.root_path), id.as_str()))
    }

    async fn update_step(&self, step: &Step) -> Result<()> {
        self.replace_entity(&paths::steps_dir(&self.root_path), "step", step.id.as_str(), step)
    }

    async fn list_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<Step>> {
        let mut steps =
            self.list_entities(&paths::steps_dir(&self.root_path), |s: &Step| &s.workflow_id == workflow_id)?;
        steps.sort_by_key(|s| s.order_index);
        Ok(steps)
    }

    async fn create_integration(&self, record: &IntegrationRecord) -> Result<()> {
        self.create_entity(&paths::integrations_dir(&self.root_path), record.id.as_str(), record)
    }

    async fn get_integration(&self, id: &IntegrationId) -> Result<Option<IntegrationRecord>> {
        self.read_entity(&Self::entity_path(&paths::integrations_dir(&self.root_path), id.as_str()))
    }

    async fn update_integration(&self, record: &IntegrationRecord) -> Result<()> {
        self.replace_entity(
            &paths::integrations_dir(&self.root_path),
            "integration",
            record.id.as_str(),
            record,
        )
    }

    async fn list_integrations(&self, workflow_id: &WorkflowId) -> Result<Vec<IntegrationRecord>> {
        let mut records = self.list_entities(&paths::integrations_dir(&self.root_path), |r: &IntegrationRecord| {
            &r.workflow_id == workflow_id
        })?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn list_integrations_by_status(&self, status: IntegrationStatus) -> Result<Vec<IntegrationRecord>> {
        let mut records = self.list_entities(&paths::integrations_dir(&self.root_path), |r: &IntegrationRecord| {
            r.status == status
        })?;
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn create_exception(&self, exception: &WorkflowException) -> Result<()> {
        self.create_entity(&paths::exceptions_dir(&self.root_path), exception.id.as_str(), exception)
    }

    async fn get_exception(&self, id: &ExceptionId) -> Result<Option<WorkflowException>> {
        self.read_entity(&Self::entity_path(&paths::exceptions_dir(&self.root_path), id.as_str()))
    }

    async fn update_exception(&self, exception: &WorkflowException) -> Result<()> {
        self.replace_entity(
            &paths::exceptions_dir(&self.root_path),
            "exception",
            exception.id.as_str(),
            exception,
        )
    }

    async fn list_exceptions(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowException>> {
        let mut exceptions = self.list_entities(&paths::exceptions_dir(&self.root_path), |e: &WorkflowException| {
            &e.workflow_id == workflow_id
        })?;
        exceptions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(exceptions)
    }

    async fn create_documents(&self, documents: &[Document]) -> Result<()> {
        let entries: Vec<(String, &Document)> = documents.iter().map(|d| (d.id.to_string(), d)).collect();
        self.create_batch(&paths::documents_dir(&self.root_path), &entries)
    }

    async fn list_documents(&self, workflow_id: &WorkflowId) -> Result<Vec<Document>> {
        let mut documents =
            self.list_entities(&paths::documents_dir(&self.root_path), |d: &Document| &d.workflow_id == workflow_id)?;
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(documents)
    }

    async fn lock_workflow(&self, id: &WorkflowId) -> Result<WorkflowGuard> {
        let guard = self.locks.acquire(id).await?;

        let path = paths::locks_dir(&self.root_path).join(paths::lock_file_name(id.as_str()));
        let file_lock = tokio::task::spawn_blocking(move || FileLock::acquire(&path))
            .await
            .map_err(|e| OnboardingError::Persistence(format!("Workflow lock task failed: {}", e)))??;

        Ok(guard.with_file_lock(file_lock))
    }
}
