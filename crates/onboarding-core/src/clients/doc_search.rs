//! Document-search client for locating onboarding documents

use super::{build_http_client, provider_error};
use crate::config::DocSearchConfig;
use crate::error::Result;
use crate::types::{DocumentSearchRequest, DocumentSearchResponse};
use crate::workflow::traits::DocumentSearchClient;
use async_trait::async_trait;
use onboarding_types::IntegrationType;
use reqwest::Client as HttpClient;
use serde_json::json;

pub struct DocSearchClient {
    config: DocSearchConfig,
    http_client: HttpClient,
}

impl DocSearchClient {
    pub fn new(config: DocSearchConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            http_client: build_http_client(timeout_secs)?,
        })
    }

    pub fn default_limit(&self) -> u32 {
        self.config.default_limit
    }
}

#[async_trait]
impl DocumentSearchClient for DocSearchClient {
    async fn search_documents(&self, request: &DocumentSearchRequest) -> Result<DocumentSearchResponse> {
        let url = format!("{}/v1/search", self.config.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("X-Api-Key", &self.config.api_key)
            .json(&json!({
                "query": request.query,
                "limit": request.limit,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(IntegrationType::DocSearch, response).await);
        }

        let result: DocumentSearchResponse = response.json().await?;
        log::debug!("Document search '{}' returned {} hits", request.query, result.total_count);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_accepts_provider_field_names() {
        let body = r#"{
            "total_count": 1,
            "documents": [{
                "name": "I-9 Form",
                "type": "tax_form",
                "storage_key": "s3://hr-docs/i9.pdf",
                "file_type": "pdf",
                "size": 20480,
                "metadata": {"year": 2025}
            }]
        }"#;
        let parsed: DocumentSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.total_count, 1);
        assert_eq!(parsed.documents[0].document_type, "tax_form");
        assert_eq!(parsed.documents[0].size, 20480);
        assert_eq!(parsed.documents[0].metadata["year"], 2025);
    }
}
