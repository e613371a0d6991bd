//! Stage advancement
//!
//! Stages form a fixed line `pre-boarding -> day-1 -> week-1 -> month-1 ->
//! completed`. A workflow leaves its current stage once every step tagged
//! with that stage is completed or skipped. Terminal workflows never move.

use chrono::{DateTime, Utc};
use onboarding_types::{Stage, Step, Workflow};

use crate::error::{OnboardingError, Result};

/// Result of a stage advancement check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Workflow is completed or cancelled
    Inert,
    /// Current stage still has unfinished steps
    Unchanged,
    Advanced { from: Stage, to: Stage },
}

impl StageOutcome {
    pub fn advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// True when every step of `stage` is finished; an empty stage is vacuously done
pub fn stage_complete(steps: &[Step], stage: Stage) -> bool {
    steps.iter().filter(|s| s.stage == stage).all(Step::is_finished)
}

/// Advance `workflow` past every finished stage, starting at its current one.
///
/// Each stage entered applies its own checkpoint, so progress only grows.
/// Stages without steps are passed through.
pub fn maybe_advance(workflow: &mut Workflow, steps: &[Step], now: DateTime<Utc>) -> StageOutcome {
    if workflow.is_terminal() {
        return StageOutcome::Inert;
    }

    let from = workflow.current_stage;
    while !workflow.is_terminal() && stage_complete(steps, workflow.current_stage) {
        match workflow.current_stage.next() {
            Some(next) => advance_to(workflow, next, now),
            None => break,
        };
    }

    if workflow.current_stage == from {
        StageOutcome::Unchanged
    } else {
        StageOutcome::Advanced {
            from,
            to: workflow.current_stage,
        }
    }
}

/// Manual override: move one stage forward regardless of step state
pub fn force_advance(workflow: &mut Workflow, now: DateTime<Utc>) -> Result<StageOutcome> {
    if workflow.is_terminal() {
        return Err(OnboardingError::InvalidTransition(format!(
            "workflow {} is {} and cannot advance",
            workflow.id, workflow.status
        )));
    }

    let next = workflow.current_stage.next().ok_or_else(|| {
        OnboardingError::InvalidTransition(format!("workflow {} is already past the last stage", workflow.id))
    })?;

    Ok(advance_to(workflow, next, now))
}

fn advance_to(workflow: &mut Workflow, next: Stage, now: DateTime<Utc>) -> StageOutcome {
    let from = workflow.current_stage;
    workflow.enter_stage(next, now);
    log::info!(
        "Workflow {} advanced from {} to {} ({}%)",
        workflow.id,
        from,
        next,
        workflow.overall_progress
    );
    StageOutcome::Advanced { from, to: next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding_types::*;

    fn workflow_at(stage: Stage, progress: u8) -> Workflow {
        let mut wf = Workflow::new(EmployeeId::new("emp-1"), "generic", UserId::new("hr"), None, Utc::now());
        wf.current_stage = stage;
        wf.overall_progress = progress;
        wf
    }

    fn step(workflow: &Workflow, stage: Stage, status: StepStatus) -> Step {
        let now = Utc::now();
        Step {
            id: StepId::new(),
            workflow_id: workflow.id.clone(),
            order_index: 0,
            name: "step".to_string(),
            description: String::new(),
            step_type: StepType::Manual,
            stage,
            integration_type: None,
            status,
            dependencies: vec![],
            started_at: None,
            completed_at: None,
            completed_by: None,
            skipped_by: None,
            skip_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_advances_when_stage_finished() {
        let mut wf = workflow_at(Stage::Day1, 25);
        let steps = vec![
            step(&wf, Stage::Day1, StepStatus::Completed),
            step(&wf, Stage::Day1, StepStatus::Skipped),
            step(&wf, Stage::Week1, StepStatus::Blocked),
        ];

        let outcome = maybe_advance(&mut wf, &steps, Utc::now());

        assert_eq!(
            outcome,
            StageOutcome::Advanced {
                from: Stage::Day1,
                to: Stage::Week1
            }
        );
        assert_eq!(wf.current_stage, Stage::Week1);
        assert_eq!(wf.overall_progress, 50);
    }

    #[test]
    fn test_unfinished_step_holds_stage() {
        let mut wf = workflow_at(Stage::Day1, 25);
        let steps = vec![
            step(&wf, Stage::Day1, StepStatus::Completed),
            step(&wf, Stage::Day1, StepStatus::Pending),
        ];

        assert_eq!(maybe_advance(&mut wf, &steps, Utc::now()), StageOutcome::Unchanged);
        assert_eq!(wf.current_stage, Stage::Day1);
        assert_eq!(wf.overall_progress, 25);
    }

    #[test]
    fn test_empty_stages_are_passed_through() {
        let mut wf = workflow_at(Stage::Day1, 25);
        let steps = vec![
            step(&wf, Stage::Day1, StepStatus::Completed),
            step(&wf, Stage::Month1, StepStatus::Pending),
        ];

        let outcome = maybe_advance(&mut wf, &steps, Utc::now());

        assert_eq!(
            outcome,
            StageOutcome::Advanced {
                from: Stage::Day1,
                to: Stage::Month1
            }
        );
        assert_eq!(wf.overall_progress, 75);
        assert_eq!(wf.status, WorkflowStatus::InProgress);
    }

    #[test]
    fn test_finished_later_stages_cascade_to_completion() {
        let mut wf = workflow_at(Stage::PreBoarding, 0);
        let steps = vec![
            step(&wf, Stage::PreBoarding, StepStatus::Skipped),
            step(&wf, Stage::Day1, StepStatus::Completed),
            step(&wf, Stage::Month1, StepStatus::Skipped),
        ];

        let outcome = maybe_advance(&mut wf, &steps, Utc::now());

        assert_eq!(
            outcome,
            StageOutcome::Advanced {
                from: Stage::PreBoarding,
                to: Stage::Completed
            }
        );
        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert_eq!(wf.overall_progress, 100);
    }

    #[test]
    fn test_workflow_without_remaining_steps_completes() {
        let mut wf = workflow_at(Stage::Week1, 50);

        assert!(maybe_advance(&mut wf, &[], Utc::now()).advanced());
        assert_eq!(wf.current_stage, Stage::Completed);
        assert_eq!(wf.overall_progress, 100);
    }

    #[test]
    fn test_final_stage_completes_workflow() {
        let mut wf = workflow_at(Stage::Month1, 75);
        let steps = vec![step(&wf, Stage::Month1, StepStatus::Completed)];
        let now = Utc::now();

        maybe_advance(&mut wf, &steps, now);

        assert_eq!(wf.status, WorkflowStatus::Completed);
        assert_eq!(wf.current_stage, Stage::Completed);
        assert_eq!(wf.overall_progress, 100);
        assert_eq!(wf.actual_completion_date, Some(now));
    }

    #[test]
    fn test_terminal_workflow_is_inert() {
        let mut wf = workflow_at(Stage::Day1, 25);
        wf.mark_cancelled(Utc::now());

        assert_eq!(maybe_advance(&mut wf, &[], Utc::now()), StageOutcome::Inert);
        assert_eq!(wf.current_stage, Stage::Day1);
        assert!(force_advance(&mut wf, Utc::now()).unwrap_err().is_invalid_transition());
    }

    #[test]
    fn test_force_advance_ignores_steps() {
        let mut wf = workflow_at(Stage::PreBoarding, 0);

        let outcome = force_advance(&mut wf, Utc::now()).unwrap();

        assert!(outcome.advanced());
        assert_eq!(wf.current_stage, Stage::Day1);
        assert_eq!(wf.overall_progress, 25);
    }
}
