//! Status, stage and classification enums
//!
//! Every enum serializes to the exact spelling used by the HR backend, so
//! persisted records stay readable by the rest of the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(TypesError::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum!(
    /// Lifecycle status of a workflow
    WorkflowStatus {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

impl WorkflowStatus {
    /// `completed` and `cancelled` admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

wire_enum!(
    /// Fixed, linear onboarding stages plus the terminal `completed` marker
    Stage {
        PreBoarding => "pre-boarding",
        Day1 => "day-1",
        Week1 => "week-1",
        Month1 => "month-1",
        Completed => "completed",
    }
);

impl Stage {
    pub fn first() -> Self {
        Self::PreBoarding
    }

    /// Next stage in the sequence, `None` once `completed`
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::PreBoarding => Some(Self::Day1),
            Self::Day1 => Some(Self::Week1),
            Self::Week1 => Some(Self::Month1),
            Self::Month1 => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Overall progress recorded when a workflow enters this stage
    pub fn progress_checkpoint(&self) -> u8 {
        match self {
            Self::PreBoarding => 0,
            Self::Day1 => 25,
            Self::Week1 => 50,
            Self::Month1 => 75,
            Self::Completed => 100,
        }
    }
}

wire_enum!(
    /// Status of a single checklist step
    StepStatus {
        Pending => "pending",
        Blocked => "blocked",
        InProgress => "in-progress",
        Completed => "completed",
        Skipped => "skipped",
        Failed => "failed",
    }
);

impl StepStatus {
    /// Completed and skipped steps satisfy dependencies and stage completion
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

wire_enum!(
    StepType {
        Manual => "manual",
        Integration => "integration",
    }
);

wire_enum!(
    /// External provider family an integration step talks to
    IntegrationType {
        DocuSign => "docusign",
        BackgroundCheck => "background-check",
        DocSearch => "doc-search",
    }
);

wire_enum!(
    IntegrationStatus {
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
        Failed => "failed",
    }
);

wire_enum!(
    ExceptionType {
        IntegrationFailure => "integration_failure",
        SlaBreach => "sla_breach",
        MissingDocument => "missing_document",
        Manual => "manual",
    }
);

wire_enum!(
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

wire_enum!(
    ResolutionStatus {
        Open => "open",
        InProgress => "in-progress",
        Resolved => "resolved",
    }
);
