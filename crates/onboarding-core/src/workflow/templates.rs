//! Code-defined onboarding templates
//!
//! A template is an ordered list of step definitions. Dependencies are given
//! as indexes into the same list and always point at earlier entries, so a
//! template cannot declare a cycle.

use chrono::{DateTime, Utc};
use onboarding_types::{IntegrationType, Stage, Step, StepId, StepStatus, StepType, WorkflowId};

use crate::constants::DEFAULT_TEMPLATE;

/// One step definition inside a template
#[derive(Debug, Clone, PartialEq)]
pub struct StepTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub step_type: StepType,
    pub stage: Stage,
    pub integration_type: Option<IntegrationType>,
    /// Indexes of earlier steps in the same template
    pub depends_on: &'static [usize],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTemplate {
    pub name: &'static str,
    pub expected_duration_days: i64,
    pub steps: &'static [StepTemplate],
}

const fn manual(
    name: &'static str,
    description: &'static str,
    stage: Stage,
    depends_on: &'static [usize],
) -> StepTemplate {
    StepTemplate {
        name,
        description,
        step_type: StepType::Manual,
        stage,
        integration_type: None,
        depends_on,
    }
}

const fn integration(
    name: &'static str,
    description: &'static str,
    stage: Stage,
    integration_type: IntegrationType,
    depends_on: &'static [usize],
) -> StepTemplate {
    StepTemplate {
        name,
        description,
        step_type: StepType::Integration,
        stage,
        integration_type: Some(integration_type),
        depends_on,
    }
}

pub const GENERIC: WorkflowTemplate = WorkflowTemplate {
    name: "generic",
    expected_duration_days: 30,
    steps: &[
        manual(
            "Complete new hire paperwork",
            "Collect tax, payroll and emergency contact forms",
            Stage::PreBoarding,
            &[],
        ),
        integration(
            "Sign offer letter",
            "Send the offer letter for electronic signature",
            Stage::PreBoarding,
            IntegrationType::DocuSign,
            &[],
        ),
        manual(
            "Prepare workstation",
            "Provision laptop, badge and accounts",
            Stage::Day1,
            &[0],
        ),
        manual(
            "Team introduction",
            "Welcome meeting with manager and team",
            Stage::Day1,
            &[1],
        ),
    ],
};

pub const ENGINEERING: WorkflowTemplate = WorkflowTemplate {
    name: "engineering",
    expected_duration_days: 45,
    steps: &[
        integration(
            "Sign offer letter",
            "Send the offer letter for electronic signature",
            Stage::PreBoarding,
            IntegrationType::DocuSign,
            &[],
        ),
        integration(
            "Background check",
            "Run criminal and employment verification",
            Stage::PreBoarding,
            IntegrationType::BackgroundCheck,
            &[],
        ),
        manual(
            "Complete new hire paperwork",
            "Collect tax, payroll and emergency contact forms",
            Stage::PreBoarding,
            &[],
        ),
        manual(
            "Provision hardware and accounts",
            "Laptop, SSO, source control and chat access",
            Stage::Day1,
            &[1],
        ),
        integration(
            "Collect engineering handbook",
            "Locate the handbook and security policies for the new hire",
            Stage::Day1,
            IntegrationType::DocSearch,
            &[0],
        ),
        manual(
            "Team introduction",
            "Welcome meeting with manager and team",
            Stage::Day1,
            &[2],
        ),
        manual(
            "Development environment setup",
            "Clone repositories and run the build locally",
            Stage::Week1,
            &[3],
        ),
        manual(
            "Security training",
            "Complete secure coding and data handling courses",
            Stage::Week1,
            &[4],
        ),
        manual(
            "First code review",
            "Ship a first change through review",
            Stage::Month1,
            &[6],
        ),
        manual(
            "30-day check-in",
            "Manager check-in on goals and feedback",
            Stage::Month1,
            &[7, 8],
        ),
    ],
};

pub const REMOTE: WorkflowTemplate = WorkflowTemplate {
    name: "remote",
    expected_duration_days: 30,
    steps: &[
        integration(
            "Sign offer letter",
            "Send the offer letter for electronic signature",
            Stage::PreBoarding,
            IntegrationType::DocuSign,
            &[],
        ),
        manual(
            "Ship equipment",
            "Ship laptop and peripherals to the home address",
            Stage::PreBoarding,
            &[],
        ),
        manual(
            "Remote workstation setup",
            "Verify VPN, SSO and video conferencing at home",
            Stage::Day1,
            &[1],
        ),
        manual(
            "Virtual team welcome",
            "Video call with manager and team",
            Stage::Day1,
            &[0],
        ),
        integration(
            "Collect remote work policies",
            "Locate remote work and expense policies",
            Stage::Week1,
            IntegrationType::DocSearch,
            &[0],
        ),
        manual(
            "Onboarding buddy call",
            "Weekly call with the assigned onboarding buddy",
            Stage::Week1,
            &[3],
        ),
        manual(
            "30-day check-in",
            "Manager check-in on goals and feedback",
            Stage::Month1,
            &[4, 5],
        ),
    ],
};

const TEMPLATES: &[&WorkflowTemplate] = &[&GENERIC, &ENGINEERING, &REMOTE];

/// Look up a template by name; unknown names fall back to the generic template
pub fn template_for(name: &str) -> &'static WorkflowTemplate {
    TEMPLATES
        .iter()
        .copied()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .unwrap_or_else(|| {
            log::warn!("Unknown template '{}', falling back to '{}'", name, DEFAULT_TEMPLATE);
            TEMPLATES[0]
        })
}

pub fn template_names() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}

/// Materialize the step list of `template` for a new workflow.
///
/// First-stage steps without dependencies start `pending`; every other step
/// starts `blocked`.
pub fn generate_steps(workflow_id: &WorkflowId, template: &WorkflowTemplate, now: DateTime<Utc>) -> Vec<Step> {
    let ids: Vec<StepId> = template.steps.iter().map(|_| StepId::new()).collect();

    template
        .steps
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let status = if def.stage == Stage::first() && def.depends_on.is_empty() {
                StepStatus::Pending
            } else {
                StepStatus::Blocked
            };

            Step {
                id: ids[index].clone(),
                workflow_id: workflow_id.clone(),
                order_index: index as u32,
                name: def.name.to_string(),
                description: def.description.to_string(),
                step_type: def.step_type,
                stage: def.stage,
                integration_type: def.integration_type,
                status,
                dependencies: def.depends_on.iter().map(|&dep| ids[dep].clone()).collect(),
                started_at: None,
                completed_at: None,
                completed_by: None,
                skipped_by: None,
                skip_reason: None,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}
