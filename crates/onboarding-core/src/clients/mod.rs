//! Client modules for external services

pub mod background_check;
pub mod doc_search;
pub mod docusign;
pub mod employee;

// Re-export all client types
pub use background_check::{BackgroundCheckHttpClient, BackgroundCheckProviders};
pub use doc_search::DocSearchClient;
pub use docusign::DocuSignClient;
pub use employee::{HttpEmployeeDirectory, StaticEmployeeDirectory};

use crate::error::{OnboardingError, Result};
use onboarding_types::IntegrationType;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Build the shared reqwest client used by every HTTP adapter
pub(crate) fn build_http_client(timeout_secs: u64) -> Result<HttpClient> {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OnboardingError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success provider response into an integration failure
pub(crate) async fn provider_error(integration: IntegrationType, response: reqwest::Response) -> OnboardingError {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    OnboardingError::IntegrationFailure {
        integration,
        message: format!("provider returned {}: {}", status, body),
    }
}
