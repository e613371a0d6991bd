//! Strongly typed identifiers
//!
//! Entity IDs minted by the engine are UUID-backed and validated on parse.
//! IDs owned by other systems (employees, users) are opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(s: &str) -> Result<Self, TypesError> {
                uuid::Uuid::parse_str(s)
                    .map(|_| Self(s.to_string()))
                    .map_err(|e| TypesError::InvalidId {
                        kind: stringify!($name),
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Onboarding workflow instance
    WorkflowId
);
uuid_id!(
    /// Checklist step within a workflow
    StepId
);
uuid_id!(
    /// Audit record of one outbound integration call
    IntegrationId
);
uuid_id!(
    /// Exception requiring human attention
    ExceptionId
);
uuid_id!(
    /// Document materialized from a document-search response
    DocumentId
);

opaque_id!(
    /// Employee reference owned by the HR employee service
    EmployeeId
);
opaque_id!(
    /// Actor performing an operation (HR user, manager, system account)
    UserId
);
