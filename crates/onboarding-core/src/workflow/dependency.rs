//! Step dependency resolution
//!
//! Pure predicates over already-loaded step state. A dependency that does not
//! resolve to a loaded step counts as unmet. Templates never declare cycles,
//! so no cycle detection happens here.

use chrono::{DateTime, Utc};
use onboarding_types::{Stage, Step, StepId, StepStatus};

/// Dependencies of `step` that are neither completed nor skipped
pub fn unmet_dependencies(step: &Step, loaded: &[Step]) -> Vec<StepId> {
    step.dependencies
        .iter()
        .filter(|dep| {
            !loaded
                .iter()
                .any(|candidate| &candidate.id == *dep && candidate.is_finished())
        })
        .cloned()
        .collect()
}

/// Whether `step` may enter `in-progress`
pub fn is_eligible(step: &Step, loaded: &[Step]) -> bool {
    unmet_dependencies(step, loaded).is_empty()
}

/// Move blocked steps of `stage` whose dependencies are satisfied to pending.
///
/// Returns the updated steps so the caller can persist them.
pub fn release_blocked(steps: &mut [Step], stage: Stage, now: DateTime<Utc>) -> Vec<Step> {
    let view: &[Step] = steps;
    let releasable: Vec<StepId> = view
        .iter()
        .filter(|s| s.stage == stage && s.status == StepStatus::Blocked && is_eligible(s, view))
        .map(|s| s.id.clone())
        .collect();

    steps
        .iter_mut()
        .filter(|s| releasable.contains(&s.id))
        .map(|s| {
            s.mark_pending(now);
            s.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboarding_types::{StepType, WorkflowId};

    fn step(status: StepStatus, stage: Stage, dependencies: Vec<StepId>) -> Step {
        let now = Utc::now();
        Step {
            id: StepId::new(),
            workflow_id: WorkflowId::new(),
            order_index: 0,
            name: "step".to_string(),
            description: String::new(),
            step_type: StepType::Manual,
            stage,
            integration_type: None,
            status,
            dependencies,
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
    fn test_no_dependencies_is_eligible() {
        let s = step(StepStatus::Blocked, Stage::Day1, vec![]);
        assert!(is_eligible(&s, &[]));
    }

    #[test]
    fn test_completed_and_skipped_satisfy() {
        let done = step(StepStatus::Completed, Stage::PreBoarding, vec![]);
        let skipped = step(StepStatus::Skipped, Stage::PreBoarding, vec![]);
        let s = step(StepStatus::Blocked, Stage::Day1, vec![done.id.clone(), skipped.id.clone()]);

        assert!(is_eligible(&s, &[done, skipped]));
    }

    #[test]
    fn test_unfinished_dependency_is_unmet() {
        let running = step(StepStatus::InProgress, Stage::PreBoarding, vec![]);
        let failed = step(StepStatus::Failed, Stage::PreBoarding, vec![]);
        let s = step(StepStatus::Blocked, Stage::Day1, vec![running.id.clone(), failed.id.clone()]);

        let unmet = unmet_dependencies(&s, &[running.clone(), failed.clone()]);
        assert_eq!(unmet, vec![running.id, failed.id]);
    }

    #[test]
    fn test_missing_dependency_fails_closed() {
        let s = step(StepStatus::Pending, Stage::Day1, vec![StepId::new()]);
        assert!(!is_eligible(&s, &[]));
    }

    #[test]
    fn test_release_blocked_only_in_stage() {
        let done = step(StepStatus::Completed, Stage::PreBoarding, vec![]);
        let day1 = step(StepStatus::Blocked, Stage::Day1, vec![done.id.clone()]);
        let week1 = step(StepStatus::Blocked, Stage::Week1, vec![done.id.clone()]);
        let waiting = step(StepStatus::Blocked, Stage::Day1, vec![week1.id.clone()]);
        let mut steps = vec![done, day1.clone(), week1, waiting];

        let released = release_blocked(&mut steps, Stage::Day1, Utc::now());

        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, day1.id);
        assert_eq!(steps[1].status, StepStatus::Pending);
        assert_eq!(steps[2].status, StepStatus::Blocked);
        assert_eq!(steps[3].status, StepStatus::Blocked);
    }
}
