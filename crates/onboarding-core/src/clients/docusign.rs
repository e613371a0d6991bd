//! DocuSign client for sending signature envelopes

use super::{build_http_client, provider_error};
use crate::config::DocuSignConfig;
use crate::error::{OnboardingError, Result};
use crate::types::{EnvelopeRequest, EnvelopeResponse};
use crate::workflow::traits::DocumentSigningClient;
use async_trait::async_trait;
use chrono::Utc;
use onboarding_types::IntegrationType;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

pub struct DocuSignClient {
    config: DocuSignConfig,
    http_client: HttpClient,
}

impl DocuSignClient {
    pub fn new(config: DocuSignConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            http_client: build_http_client(timeout_secs)?,
        })
    }

    fn parse_envelope(&self, data: &Value, request: &EnvelopeRequest) -> Result<EnvelopeResponse> {
        let envelope_id = data["envelopeId"]
            .as_str()
            .or_else(|| data["envelope_id"].as_str())
            .ok_or_else(|| OnboardingError::IntegrationFailure {
                integration: IntegrationType::DocuSign,
                message: "response is missing the envelope ID".to_string(),
            })?;

        let sent_at = data["statusDateTime"]
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(EnvelopeResponse {
            envelope_id: envelope_id.to_string(),
            status: data["status"].as_str().unwrap_or("sent").to_string(),
            sent_at,
            signer_email: request.signer_email.clone(),
        })
    }
}

#[async_trait]
impl DocumentSigningClient for DocuSignClient {
    async fn send_envelope(&self, request: &EnvelopeRequest) -> Result<EnvelopeResponse> {
        let url = format!(
            "{}/v2.1/accounts/{}/envelopes",
            self.config.base_url, self.config.account_id
        );

        let body = json!({
            "emailSubject": format!("Please sign: {}", request.document_type),
            "templateRoles": [{
                "email": request.signer_email,
                "name": request.signer_name,
                "roleName": "signer",
                "clientUserId": request.employee_id.as_str(),
            }],
            "customFields": {
                "textCustomFields": [
                    {"name": "document_type", "value": request.document_type},
                    {"name": "employee_id", "value": request.employee_id.as_str()}
                ]
            },
            "status": "sent"
        });

        log::debug!("Sending {} envelope to {}", request.document_type, request.signer_email);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(IntegrationType::DocuSign, response).await);
        }

        let data: Value = response.json().await?;
        self.parse_envelope(&data, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding_types::EmployeeId;

    fn client() -> DocuSignClient {
        DocuSignClient::new(
            DocuSignConfig {
                api_key: "key".to_string(),
                base_url: "https://demo.docusign.net/restapi".to_string(),
                account_id: "acct".to_string(),
            },
            5,
        )
        .unwrap()
    }

    fn request() -> EnvelopeRequest {
        EnvelopeRequest {
            document_type: "offer_letter".to_string(),
            signer_email: "ada@example.com".to_string(),
            signer_name: "Ada Lovelace".to_string(),
            employee_id: EmployeeId::new("emp-1"),
        }
    }

    #[test]
    fn test_parse_envelope_response() {
        let data = json!({
            "envelopeId": "env-123",
            "status": "sent",
            "statusDateTime": "2025-01-01T10:00:00Z"
        });
        let envelope = client().parse_envelope(&data, &request()).unwrap();
        assert_eq!(envelope.envelope_id, "env-123");
        assert_eq!(envelope.status, "sent");
        assert_eq!(envelope.signer_email, "ada@example.com");
        assert_eq!(envelope.sent_at.to_rfc3339(), "2025-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_envelope_without_id_fails() {
        let data = json!({"status": "sent"});
        let err = client().parse_envelope(&data, &request()).unwrap_err();
        assert!(err.to_string().contains("envelope ID"));
    }
}
