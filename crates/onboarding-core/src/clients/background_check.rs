//! Background-check provider clients and the provider lookup table

use super::{build_http_client, provider_error};
use crate::config::{BackgroundCheckConfig, ProviderConfig};
use crate::error::{OnboardingError, Result};
use crate::types::{BackgroundCheckRequest, BackgroundCheckResponse};
use crate::workflow::traits::BackgroundCheckClient;
use async_trait::async_trait;
use chrono::Utc;
use onboarding_types::IntegrationType;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// HTTP client for one background-check provider
pub struct BackgroundCheckHttpClient {
    provider: String,
    config: ProviderConfig,
    http_client: HttpClient,
}

impl BackgroundCheckHttpClient {
    pub fn new(provider: impl Into<String>, config: ProviderConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            provider: provider.into(),
            config,
            http_client: build_http_client(timeout_secs)?,
        })
    }

    fn parse_check(&self, data: &Value, request: &BackgroundCheckRequest) -> Result<BackgroundCheckResponse> {
        let check_id = data["id"]
            .as_str()
            .or_else(|| data["check_id"].as_str())
            .ok_or_else(|| OnboardingError::IntegrationFailure {
                integration: IntegrationType::BackgroundCheck,
                message: format!("{} response is missing the check ID", self.provider),
            })?;

        let check_types = data["check_types"]
            .as_array()
            .map(|types| {
                types
                    .iter()
                    .filter_map(|t| t.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_else(|| request.check_types.clone());

        Ok(BackgroundCheckResponse {
            check_id: check_id.to_string(),
            status: data["status"].as_str().unwrap_or("pending").to_string(),
            candidate: data["candidate_id"]
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("{} {}", request.first_name, request.last_name)),
            check_types,
            initiated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl BackgroundCheckClient for BackgroundCheckHttpClient {
    async fn initiate_check(&self, request: &BackgroundCheckRequest) -> Result<BackgroundCheckResponse> {
        let url = format!("{}/v1/checks", self.config.base_url);

        let body = json!({
            "candidate": {
                "first_name": request.first_name,
                "last_name": request.last_name,
                "email": request.email,
                "reference": request.employee_id.as_str(),
            },
            "check_types": request.check_types,
        });

        log::debug!("Requesting {} background check for employee {}", self.provider, request.employee_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(IntegrationType::BackgroundCheck, response).await);
        }

        let data: Value = response.json().await?;
        self.parse_check(&data, request)
    }
}

/// Named background-check providers with a default.
///
/// Built once and handed to the orchestrator; there is no process-wide
/// registry.
#[derive(Clone)]
pub struct BackgroundCheckProviders {
    default_provider: String,
    providers: BTreeMap<String, Arc<dyn BackgroundCheckClient>>,
}

impl BackgroundCheckProviders {
    /// Table holding a single provider that is also the default
    pub fn single(name: impl Into<String>, client: Arc<dyn BackgroundCheckClient>) -> Self {
        let name = name.into();
        let mut providers = BTreeMap::new();
        providers.insert(name.clone(), client);
        Self {
            default_provider: name,
            providers,
        }
    }

    /// Register another provider
    pub fn with_provider(mut self, name: impl Into<String>, client: Arc<dyn BackgroundCheckClient>) -> Self {
        self.providers.insert(name.into(), client);
        self
    }

    /// Build HTTP clients for every configured provider
    pub fn from_config(config: &BackgroundCheckConfig, timeout_secs: u64) -> Result<Self> {
        let mut providers: BTreeMap<String, Arc<dyn BackgroundCheckClient>> = BTreeMap::new();
        for (name, provider) in &config.providers {
            let client = BackgroundCheckHttpClient::new(name.clone(), provider.clone(), timeout_secs)?;
            providers.insert(name.clone(), Arc::new(client));
        }

        if !providers.contains_key(&config.default_provider) {
            return Err(OnboardingError::Config(format!(
                "Unknown default background-check provider '{}'",
                config.default_provider
            )));
        }

        Ok(Self {
            default_provider: config.default_provider.clone(),
            providers,
        })
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|k| k.as_str()).collect()
    }

    /// Resolve a provider by name, or the default when `name` is `None`
    pub fn resolve(&self, name: Option<&str>) -> Result<(String, Arc<dyn BackgroundCheckClient>)> {
        let name = name.unwrap_or(&self.default_provider);
        self.providers
            .get(name)
            .map(|client| (name.to_string(), client.clone()))
            .ok_or_else(|| OnboardingError::not_found("background-check provider", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding_types::EmployeeId;

    struct FixedProvider;

    #[async_trait]
    impl BackgroundCheckClient for FixedProvider {
        async fn initiate_check(&self, request: &BackgroundCheckRequest) -> Result<BackgroundCheckResponse> {
            Ok(BackgroundCheckResponse {
                check_id: "chk-1".to_string(),
                status: "pending".to_string(),
                candidate: request.email.clone(),
                check_types: request.check_types.clone(),
                initiated_at: Utc::now(),
            })
        }
    }

    #[test]
    fn test_resolve_default_and_named_providers() {
        let providers = BackgroundCheckProviders::single("checkr", Arc::new(FixedProvider))
            .with_provider("sterling", Arc::new(FixedProvider));

        let (name, _) = providers.resolve(None).unwrap();
        assert_eq!(name, "checkr");

        let (name, _) = providers.resolve(Some("sterling")).unwrap();
        assert_eq!(name, "sterling");

        let err = providers.resolve(Some("hireright")).err().unwrap();
        assert!(err.is_not_found());
        assert_eq!(providers.names(), vec!["checkr", "sterling"]);
    }

    #[test]
    fn test_from_config_rejects_unknown_default() {
        let mut table = BTreeMap::new();
        table.insert(
            "checkr".to_string(),
            ProviderConfig {
                api_key: "key".to_string(),
                base_url: "https://api.checkr.com".to_string(),
            },
        );
        let config = BackgroundCheckConfig {
            default_provider: "sterling".to_string(),
            providers: table,
        };
        assert!(BackgroundCheckProviders::from_config(&config, 5).is_err());
    }

    #[test]
    fn test_parse_check_falls_back_to_request_fields() {
        let client = BackgroundCheckHttpClient::new(
            "checkr",
            ProviderConfig {
                api_key: "key".to_string(),
                base_url: "https://api.checkr.com".to_string(),
            },
            5,
        )
        .unwrap();
        let request = BackgroundCheckRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            check_types: vec!["criminal".to_string()],
            employee_id: EmployeeId::new("emp-1"),
        };

        let parsed = client.parse_check(&json!({"id": "chk-9"}), &request).unwrap();
        assert_eq!(parsed.check_id, "chk-9");
        assert_eq!(parsed.status, "pending");
        assert_eq!(parsed.candidate, "Ada Lovelace");
        assert_eq!(parsed.check_types, vec!["criminal".to_string()]);
    }
}
