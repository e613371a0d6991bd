//! Employee directory implementations

use super::build_http_client;
use crate::config::EmployeeDirectoryConfig;
use crate::error::{OnboardingError, Result};
use crate::types::Employee;
use crate::workflow::traits::EmployeeDirectory;
use async_trait::async_trait;
use onboarding_types::EmployeeId;
use reqwest::{Client as HttpClient, StatusCode};
use std::collections::HashMap;

/// Employee lookup over the HR service REST API
pub struct HttpEmployeeDirectory {
    config: EmployeeDirectoryConfig,
    http_client: HttpClient,
}

impl HttpEmployeeDirectory {
    pub fn new(config: EmployeeDirectoryConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            http_client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmployeeDirectory for HttpEmployeeDirectory {
    async fn get_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Employee>> {
        let url = format!("{}/employees/{}", self.config.base_url, employee_id);

        let mut request = self.http_client.get(&url);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status().map_err(OnboardingError::Http)?;
        Ok(Some(response.json().await?))
    }
}

/// Fixed in-memory employee table
#[derive(Debug, Default, Clone)]
pub struct StaticEmployeeDirectory {
    employees: HashMap<EmployeeId, Employee>,
}

impl StaticEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(mut self, employee: Employee) -> Self {
        self.employees.insert(employee.id.clone(), employee);
        self
    }
}

#[async_trait]
impl EmployeeDirectory for StaticEmployeeDirectory {
    async fn get_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Employee>> {
        Ok(self.employees.get(employee_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let directory = StaticEmployeeDirectory::new().with_employee(Employee {
            id: EmployeeId::new("emp-1"),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            manager_id: None,
        });

        let found = directory.get_by_id(&EmployeeId::new("emp-1")).await.unwrap();
        assert_eq!(found.map(|e| e.full_name()), Some("Grace Hopper".to_string()));
        assert!(directory.get_by_id(&EmployeeId::new("emp-2")).await.unwrap().is_none());
    }
}
