//! Judge assignment service
//!
//! Allocates exactly one judge per Council/Regional submission using
//! round-robin load balancing over the eligible judges of the submission's
//! location. National submissions need no assignment. Allocation is
//! idempotent: a submission that already has an assignment gets it back
//! unchanged, and the store's at-most-once constraint resolves concurrent
//! races to a single winner.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    events::Notifier,
    models::{Judge, Level, Notification, Submission, SubmissionAssignment, SubmissionStatus},
    services::tier_policy::policy_for,
    store::{Store, SubmissionFilter},
};

/// Judge assignment service
pub struct AssignmentService;

impl AssignmentService {
    /// Assign a judge to a submission. Returns `None` for tiers that are
    /// judged one-to-many, or the (possibly pre-existing) assignment.
    pub async fn assign(
        store: &dyn Store,
        notifier: &dyn Notifier,
        submission_id: &Uuid,
    ) -> AppResult<Option<SubmissionAssignment>> {
        let submission = store
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission {} not found", submission_id)))?;

        if !policy_for(submission.level).requires_assignment() {
            return Ok(None);
        }

        // Idempotence: never reassign
        if let Some(existing) = store.find_assignment(submission_id).await? {
            return Ok(Some(existing));
        }

        let judges = Self::eligible_judges(store, &submission).await?;
        if judges.is_empty() {
            return Err(AppError::NotEligible(format!(
                "no active judges available for {} / {}",
                submission.level,
                submission.location_key()
            )));
        }

        let judge_id = Self::least_loaded(store, &submission, &judges).await?;
        let assignment = SubmissionAssignment {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            judge_id,
            level: submission.level,
            region: submission.region.clone(),
            council: submission.council.clone(),
            judge_notified: false,
            assigned_at: Utc::now(),
        };

        let assignment = match store.create_assignment(assignment).await {
            Ok(assignment) => assignment,
            // A concurrent caller won the insert; its assignment stands
            Err(AppError::DuplicateAssignment(_)) => {
                return Ok(store.find_assignment(submission_id).await?);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            submission_id = %submission.id,
            judge_id = %assignment.judge_id,
            "judge assigned"
        );

        Self::notify_assignment(store, notifier, assignment).await
    }

    /// Batch mode: allocate every unassigned submission in a scope, used
    /// when a new judge is activated for a level/region/council so the
    /// backlog is shared fairly.
    pub async fn assign_backlog(
        store: &dyn Store,
        notifier: &dyn Notifier,
        year: i32,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Vec<SubmissionAssignment>> {
        let submissions = store
            .query_submissions(&SubmissionFilter {
                year: Some(year),
                level: Some(level),
                region: region.map(String::from),
                council: council.map(String::from),
                statuses: Some(vec![SubmissionStatus::Pending]),
                include_disqualified: false,
                ..SubmissionFilter::default()
            })
            .await?;

        let mut created = Vec::new();
        for submission in &submissions {
            if store.find_assignment(&submission.id).await?.is_some() {
                continue;
            }
            if let Some(assignment) = Self::assign(store, notifier, &submission.id).await? {
                created.push(assignment);
            }
        }

        tracing::info!(
            level = %level,
            backlog = submissions.len(),
            assigned = created.len(),
            "backlog allocation complete"
        );
        Ok(created)
    }

    /// Judges eligible for the submission's scope, in directory order
    async fn eligible_judges(store: &dyn Store, submission: &Submission) -> AppResult<Vec<Judge>> {
        match submission.level {
            Level::Council => {
                store
                    .active_judges(
                        Level::Council,
                        submission.region.as_deref(),
                        submission.council.as_deref(),
                    )
                    .await
            }
            Level::Regional => {
                store
                    .active_judges(Level::Regional, submission.region.as_deref(), None)
                    .await
            }
            Level::National => Ok(Vec::new()),
        }
    }

    /// Round-robin step: the judge with the fewest assignments in this
    /// location, first in query order on ties. Counts are recomputed from
    /// the store each call rather than cached.
    async fn least_loaded(
        store: &dyn Store,
        submission: &Submission,
        judges: &[Judge],
    ) -> AppResult<Uuid> {
        let scope_assignments = store
            .assignments_in_scope(
                submission.level,
                submission.region.as_deref(),
                submission.council.as_deref(),
            )
            .await?;

        let mut best: Option<(usize, Uuid)> = None;
        for judge in judges {
            let count = scope_assignments
                .iter()
                .filter(|a| a.judge_id == judge.id)
                .count();
            if best.is_none_or(|(min, _)| count < min) {
                best = Some((count, judge.id));
            }
        }
        // judges is non-empty, checked by the caller
        best.map(|(_, id)| id)
            .ok_or_else(|| AppError::NotEligible("no judges to balance across".to_string()))
    }

    /// Fire-and-forget notification; delivery failure never rolls back the
    /// assignment, success flips `judge_notified`.
    async fn notify_assignment(
        store: &dyn Store,
        notifier: &dyn Notifier,
        mut assignment: SubmissionAssignment,
    ) -> AppResult<Option<SubmissionAssignment>> {
        match notifier
            .notify(Notification::JudgeAssigned {
                judge_id: assignment.judge_id,
                submission_id: assignment.submission_id,
                level: assignment.level,
            })
            .await
        {
            Ok(()) => {
                assignment.judge_notified = true;
                assignment = store.update_assignment(assignment).await?;
            }
            Err(e) => {
                tracing::warn!(
                    submission_id = %assignment.submission_id,
                    "judge notification failed: {}",
                    e
                );
            }
        }
        Ok(Some(assignment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LogNotifier, MockNotifier};
    use crate::store::{AssignmentStore, JudgeDirectory, MemoryStore, SubmissionStore};
    use crate::testing::{new_judge, new_submission};

    async fn seed_submission(store: &MemoryStore, level: Level) -> Submission {
        let submission = match level {
            Level::Council => new_submission(level, Some("north"), Some("hilltop")),
            Level::Regional => new_submission(level, Some("north"), None),
            Level::National => new_submission(level, None, None),
        };
        store.create_submission(submission.clone()).await.unwrap();
        submission
    }

    #[tokio::test]
    async fn test_national_needs_no_assignment() {
        let store = MemoryStore::new();
        let submission = seed_submission(&store, Level::National).await;

        let assignment = AssignmentService::assign(&store, &LogNotifier, &submission.id)
            .await
            .unwrap();
        assert!(assignment.is_none());
    }

    #[tokio::test]
    async fn test_no_eligible_judges_fails() {
        let store = MemoryStore::new();
        let submission = seed_submission(&store, Level::Council).await;

        // A judge for the wrong council does not count
        store
            .create_judge(new_judge(Level::Council, Some("north"), Some("riverside")))
            .await
            .unwrap();

        let err = AssignmentService::assign(&store, &LogNotifier, &submission.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotEligible(_)));
    }

    #[tokio::test]
    async fn test_assignment_is_idempotent() {
        let store = MemoryStore::new();
        let submission = seed_submission(&store, Level::Council).await;
        store
            .create_judge(new_judge(Level::Council, Some("north"), Some("hilltop")))
            .await
            .unwrap();

        let first = AssignmentService::assign(&store, &LogNotifier, &submission.id)
            .await
            .unwrap()
            .unwrap();
        let second = AssignmentService::assign(&store, &LogNotifier, &submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.judge_id, second.judge_id);
    }

    #[tokio::test]
    async fn test_round_robin_balances_within_one() {
        let store = MemoryStore::new();

        let judges: Vec<Judge> = (0..3)
            .map(|_| new_judge(Level::Regional, Some("north"), None))
            .collect();
        for judge in &judges {
            store.create_judge(judge.clone()).await.unwrap();
        }

        let mut counts = std::collections::HashMap::new();
        for _ in 0..8 {
            let submission = seed_submission(&store, Level::Regional).await;
            let assignment = AssignmentService::assign(&store, &LogNotifier, &submission.id)
                .await
                .unwrap()
                .unwrap();
            *counts.entry(assignment.judge_id).or_insert(0u32) += 1;
        }

        let min = counts.values().min().copied().unwrap();
        let max = counts.values().max().copied().unwrap();
        assert_eq!(counts.len(), 3);
        assert!(max - min <= 1, "per-judge load differs by more than 1");
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_assignment() {
        let store = MemoryStore::new();
        let submission = seed_submission(&store, Level::Council).await;
        store
            .create_judge(new_judge(Level::Council, Some("north"), Some("hilltop")))
            .await
            .unwrap();

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .returning(|_| Err(AppError::Storage("emitter down".into())));

        let assignment = AssignmentService::assign(&store, &notifier, &submission.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!assignment.judge_notified);

        // The assignment persisted despite the failed notification
        let stored = store.find_assignment(&submission.id).await.unwrap().unwrap();
        assert_eq!(stored.judge_id, assignment.judge_id);
    }

    #[tokio::test]
    async fn test_backlog_allocation_shares_fairly() {
        let store = MemoryStore::new();
        for _ in 0..4 {
            seed_submission(&store, Level::Regional).await;
        }
        store
            .create_judge(new_judge(Level::Regional, Some("north"), None))
            .await
            .unwrap();
        store
            .create_judge(new_judge(Level::Regional, Some("north"), None))
            .await
            .unwrap();

        let created = AssignmentService::assign_backlog(
            &store,
            &LogNotifier,
            2026,
            Level::Regional,
            Some("north"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(created.len(), 4);

        let mut counts = std::collections::HashMap::new();
        for assignment in &created {
            *counts.entry(assignment.judge_id).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|&c| c == 2));
    }
}
