//! Progress snapshot computed on demand from live step state

use chrono::{DateTime, Utc};
use onboarding_types::{Stage, Step, StepStatus, Workflow, WorkflowException, WorkflowId, WorkflowStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub current_stage: Stage,
    pub overall_progress: u8,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub skipped_steps: usize,
    pub in_progress_steps: usize,
    pub pending_steps: usize,
    pub blocked_steps: usize,
    pub failed_steps: usize,
    /// `completed_steps * 100 / total_steps`, 0 without steps
    pub percentage: u32,
    pub days_elapsed: i64,
    pub expected_days: Option<i64>,
    pub on_track: bool,
    pub open_exceptions: usize,
}

impl ProgressSnapshot {
    /// Build a snapshot of `workflow` at `now`.
    ///
    /// A workflow is on track while the whole days elapsed since its start do
    /// not exceed the expected duration. Without an expected completion date
    /// it is always on track.
    pub fn compute(
        workflow: &Workflow,
        steps: &[Step],
        exceptions: &[WorkflowException],
        now: DateTime<Utc>,
    ) -> Self {
        let count = |status: StepStatus| steps.iter().filter(|s| s.status == status).count();

        let total_steps = steps.len();
        let completed_steps = count(StepStatus::Completed);
        let percentage = if total_steps == 0 {
            0
        } else {
            (completed_steps * 100 / total_steps) as u32
        };

        let days_elapsed = (now - workflow.start_date).num_days();
        let expected_days = workflow
            .expected_completion_date
            .map(|expected| (expected - workflow.start_date).num_days());
        let on_track = expected_days.map_or(true, |expected| days_elapsed <= expected);

        Self {
            workflow_id: workflow.id.clone(),
            status: workflow.status,
            current_stage: workflow.current_stage,
            overall_progress: workflow.overall_progress,
            total_steps,
            completed_steps,
            skipped_steps: count(StepStatus::Skipped),
            in_progress_steps: count(StepStatus::InProgress),
            pending_steps: count(StepStatus::Pending),
            blocked_steps: count(StepStatus::Blocked),
            failed_steps: count(StepStatus::Failed),
            percentage,
            days_elapsed,
            expected_days,
            on_track,
            open_exceptions: exceptions.iter().filter(|e| e.is_open()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use onboarding_types::*;

    fn steps_with(workflow: &Workflow, statuses: &[StepStatus]) -> Vec<Step> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| Step {
                id: StepId::new(),
                workflow_id: workflow.id.clone(),
                order_index: i as u32,
                name: format!("step {}", i),
                description: String::new(),
                step_type: StepType::Manual,
                stage: Stage::PreBoarding,
                integration_type: None,
                status,
                dependencies: vec![],
                started_at: None,
                completed_at: None,
                completed_by: None,
                skipped_by: None,
                skip_reason: None,
                created_at: workflow.start_date,
                updated_at: workflow.start_date,
            })
            .collect()
    }

    #[test]
    fn test_percentage_uses_integer_division() {
        let start = Utc::now();
        let wf = Workflow::new(EmployeeId::new("e"), "generic", UserId::new("hr"), None, start);
        let steps = steps_with(
            &wf,
            &[StepStatus::Completed, StepStatus::Skipped, StepStatus::Pending],
        );

        let snapshot = ProgressSnapshot::compute(&wf, &steps, &[], start);

        assert_eq!(snapshot.total_steps, 3);
        assert_eq!(snapshot.completed_steps, 1);
        assert_eq!(snapshot.skipped_steps, 1);
        assert_eq!(snapshot.pending_steps, 1);
        assert_eq!(snapshot.percentage, 33);
    }

    #[test]
    fn test_no_steps_is_zero_percent() {
        let start = Utc::now();
        let wf = Workflow::new(EmployeeId::new("e"), "generic", UserId::new("hr"), None, start);

        let snapshot = ProgressSnapshot::compute(&wf, &[], &[], start);

        assert_eq!(snapshot.percentage, 0);
        assert!(snapshot.on_track);
        assert_eq!(snapshot.expected_days, None);
    }

    #[test]
    fn test_on_track_compares_elapsed_days() {
        let start = Utc::now();
        let wf = Workflow::new(
            EmployeeId::new("e"),
            "generic",
            UserId::new("hr"),
            Some(start + Duration::days(30)),
            start,
        );

        let on_day_30 = ProgressSnapshot::compute(&wf, &[], &[], start + Duration::days(30));
        assert_eq!(on_day_30.days_elapsed, 30);
        assert_eq!(on_day_30.expected_days, Some(30));
        assert!(on_day_30.on_track);

        let on_day_31 = ProgressSnapshot::compute(&wf, &[], &[], start + Duration::days(31));
        assert!(!on_day_31.on_track);
    }

    #[test]
    fn test_counts_open_exceptions_only() {
        let now = Utc::now();
        let wf = Workflow::new(EmployeeId::new("e"), "generic", UserId::new("hr"), None, now);
        let open = WorkflowException::new(
            wf.id.clone(),
            None,
            ExceptionType::SlaBreach,
            Severity::Medium,
            "late",
            "",
            now,
        );
        let mut resolved = open.clone();
        resolved.resolve(UserId::new("hr"), "done", now);
        let mut working = open.clone();
        working.resolution_status = ResolutionStatus::InProgress;

        let snapshot = ProgressSnapshot::compute(&wf, &[], &[open, resolved, working], now);

        assert_eq!(snapshot.open_exceptions, 2);
    }
}
