//! Configuration management for the onboarding engine

use crate::constants::{DEFAULT_DOC_SEARCH_LIMIT, DEFAULT_INTEGRATION_TIMEOUT_SECS};
use crate::error::{OnboardingError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `ONBOARDING__DOCUSIGN__API_KEY`
pub const ENV_PREFIX: &str = "ONBOARDING";

/// Raw configuration structure as written in the config file
#[derive(Debug, Deserialize)]
struct RawConfig {
    pub docusign: DocuSignConfig,

    #[serde(alias = "background_checks")]
    pub background_check: RawBackgroundCheckConfig,

    #[serde(alias = "document_search")]
    pub doc_search: DocSearchConfig,

    #[serde(alias = "employees")]
    pub employee_directory: EmployeeDirectoryConfig,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct RawBackgroundCheckConfig {
    #[serde(default)]
    pub default_provider: Option<String>,
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    pub docusign: DocuSignConfig,
    pub background_check: BackgroundCheckConfig,
    pub doc_search: DocSearchConfig,
    pub employee_directory: EmployeeDirectoryConfig,
    pub workflow: WorkflowSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocuSignConfig {
    #[serde(alias = "token")]
    pub api_key: String,

    #[serde(alias = "url")]
    pub base_url: String,

    pub account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundCheckConfig {
    pub default_provider: String,
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Connection settings of one background-check provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(alias = "token")]
    pub api_key: String,

    #[serde(alias = "url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocSearchConfig {
    #[serde(alias = "token")]
    pub api_key: String,

    #[serde(alias = "url")]
    pub base_url: String,

    #[serde(default = "default_doc_search_limit")]
    pub default_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDirectoryConfig {
    #[serde(alias = "url")]
    pub base_url: String,

    #[serde(alias = "token", default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Deadline for a single integration adapter call
    #[serde(default = "default_integration_timeout_secs")]
    pub integration_timeout_secs: u64,

    /// Transport timeout of the HTTP clients
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

// Default functions
fn default_doc_search_limit() -> u32 {
    DEFAULT_DOC_SEARCH_LIMIT
}

fn default_integration_timeout_secs() -> u64 {
    DEFAULT_INTEGRATION_TIMEOUT_SECS
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATA_ROOT)
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            integration_timeout_secs: default_integration_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl OnboardingConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| OnboardingError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw_config: RawConfig = serde_json::from_str(json)
            .map_err(|e| OnboardingError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self::from_raw_config(raw_config);
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file with `ONBOARDING__SECTION__KEY` environment overrides on top
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Json))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| OnboardingError::Config(format!("Failed to load config: {}", e)))?;

        let raw_config: RawConfig = settings
            .try_deserialize()
            .map_err(|e| OnboardingError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self::from_raw_config(raw_config);
        config.validate()?;
        Ok(config)
    }

    /// Convert raw config to structured config, resolving the default provider
    fn from_raw_config(raw: RawConfig) -> Self {
        let background = raw.background_check;
        let default_provider = background
            .default_provider
            .or_else(|| {
                if background.providers.len() == 1 {
                    background.providers.keys().next().cloned()
                } else {
                    None
                }
            })
            .unwrap_or_default();

        Self {
            docusign: raw.docusign,
            background_check: BackgroundCheckConfig {
                default_provider,
                providers: background.providers,
            },
            doc_search: raw.doc_search,
            employee_directory: raw.employee_directory,
            workflow: raw.workflow,
            storage: raw.storage,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.docusign.api_key.is_empty() || self.docusign.account_id.is_empty() {
            return Err(OnboardingError::Config(
                "DocuSign api_key and account_id are required".to_string(),
            ));
        }

        if self.background_check.providers.is_empty() {
            return Err(OnboardingError::Config(
                "At least one background-check provider is required".to_string(),
            ));
        }

        if !self
            .background_check
            .providers
            .contains_key(&self.background_check.default_provider)
        {
            return Err(OnboardingError::Config(format!(
                "Default background-check provider '{}' is required to be one of the configured providers",
                self.background_check.default_provider
            )));
        }

        for (name, provider) in &self.background_check.providers {
            if provider.api_key.is_empty() {
                return Err(OnboardingError::Config(format!(
                    "API key is required for background-check provider '{}'",
                    name
                )));
            }
        }

        if self.doc_search.api_key.is_empty() {
            return Err(OnboardingError::Config("Document search API key is required".to_string()));
        }

        if self.employee_directory.base_url.is_empty() {
            return Err(OnboardingError::Config(
                "Employee directory base_url is required".to_string(),
            ));
        }

        if self.workflow.integration_timeout_secs == 0 {
            return Err(OnboardingError::Config(
                "Integration timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
