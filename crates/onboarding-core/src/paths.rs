/// Directory layout of the file-backed repository
use std::path::{Path, PathBuf};

pub const WORKFLOWS_DIR_NAME: &str = "workflows";
pub const STEPS_DIR_NAME: &str = "steps";
pub const INTEGRATIONS_DIR_NAME: &str = "integrations";
pub const EXCEPTIONS_DIR_NAME: &str = "exceptions";
pub const DOCUMENTS_DIR_NAME: &str = "documents";

/// Every entity directory under a data root
pub const ENTITY_DIR_NAMES: &[&str] = &[
    WORKFLOWS_DIR_NAME,
    STEPS_DIR_NAME,
    INTEGRATIONS_DIR_NAME,
    EXCEPTIONS_DIR_NAME,
    DOCUMENTS_DIR_NAME,
];

/// Per-workflow lock files, kept apart from the entity directories
pub const LOCKS_DIR_NAME: &str = "locks";

/// Default data root when none is configured
pub const DEFAULT_DATA_ROOT: &str = "/data/onboarding";

pub fn workflows_dir(root: &Path) -> PathBuf {
    root.join(WORKFLOWS_DIR_NAME)
}

pub fn steps_dir(root: &Path) -> PathBuf {
    root.join(STEPS_DIR_NAME)
}

pub fn integrations_dir(root: &Path) -> PathBuf {
    root.join(INTEGRATIONS_DIR_NAME)
}

pub fn exceptions_dir(root: &Path) -> PathBuf {
    root.join(EXCEPTIONS_DIR_NAME)
}

pub fn documents_dir(root: &Path) -> PathBuf {
    root.join(DOCUMENTS_DIR_NAME)
}

pub fn locks_dir(root: &Path) -> PathBuf {
    root.join(LOCKS_DIR_NAME)
}

/// File name of one persisted entity
pub fn entity_file_name(id: &str) -> String {
    format!("{}.json", id)
}

pub fn lock_file_name(id: &str) -> String {
    format!("{}.lock", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_paths() {
        let root = Path::new("/tmp/onboarding");
        assert_eq!(workflows_dir(root), PathBuf::from("/tmp/onboarding/workflows"));
        assert_eq!(steps_dir(root), PathBuf::from("/tmp/onboarding/steps"));
        assert_eq!(entity_file_name("abc"), "abc.json");
        assert_eq!(locks_dir(root).join(lock_file_name("abc")), PathBuf::from("/tmp/onboarding/locks/abc.lock"));
        assert_eq!(ENTITY_DIR_NAMES.len(), 5);
    }
}
