//! Score aggregation service
//!
//! Records judge evaluations and recomputes the submission's canonical
//! score under the governing tier policy on every evaluation write. The
//! round window and (for one-to-one tiers) the acting judge's assignment
//! are verified before anything is written.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    events::Broadcaster,
    models::{
        leaderboard_channel, Evaluation, EvaluationInput, RealtimeEvent, Submission,
        SubmissionStatus,
    },
    services::tier_policy::policy_for,
    store::Store,
};

/// Score aggregation service
pub struct ScoringService;

impl ScoringService {
    /// Upsert the judge's evaluation of a submission and recompute the
    /// canonical score. The evaluation write is authoritative; a recompute
    /// failure is logged, never surfaced to the judge.
    pub async fn record_evaluation(
        store: &dyn Store,
        broadcaster: &dyn Broadcaster,
        submission_id: &Uuid,
        judge_id: &Uuid,
        input: EvaluationInput,
        now: DateTime<Utc>,
    ) -> AppResult<Evaluation> {
        input.validate()?;

        let submission = store
            .find_submission(submission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("submission {} not found", submission_id)))?;

        crate::services::RoundService::ensure_open_for_evaluation(store, &submission, now).await?;

        if policy_for(submission.level).requires_assignment() {
            let assignment = store.find_assignment(submission_id).await?.ok_or_else(|| {
                AppError::NotEligible(format!(
                    "submission {} has no judge assignment yet",
                    submission_id
                ))
            })?;
            if assignment.judge_id != *judge_id {
                return Err(AppError::NotEligible(format!(
                    "judge {} is not assigned to submission {}",
                    judge_id, submission_id
                )));
            }
        }

        let total_score = Evaluation::compute_total(&input.scores);
        let average_score = Evaluation::compute_average(&input.scores);

        let evaluation = match store.find_evaluation(submission_id, judge_id).await? {
            Some(existing) => Evaluation {
                scores: input.scores,
                comments: input.comments,
                total_score,
                average_score,
                updated_at: now,
                ..existing
            },
            None => Evaluation {
                id: Uuid::new_v4(),
                submission_id: *submission_id,
                judge_id: *judge_id,
                scores: input.scores,
                comments: input.comments,
                total_score,
                average_score,
                created_at: now,
                updated_at: now,
            },
        };
        let evaluation = store.upsert_evaluation(evaluation).await?;

        if let Err(e) = Self::recompute(store, broadcaster, submission).await {
            tracing::error!(
                submission_id = %submission_id,
                "canonical score recompute failed: {}",
                e
            );
        }

        Ok(evaluation)
    }

    /// Recompute the submission's canonical score from its evaluations and
    /// mark it evaluated. Promoted/eliminated statuses and disqualified
    /// submissions are never flipped back.
    pub async fn recompute(
        store: &dyn Store,
        broadcaster: &dyn Broadcaster,
        mut submission: Submission,
    ) -> AppResult<Submission> {
        let evaluations = store.evaluations_for(&submission.id).await?;
        let Some(canonical) = policy_for(submission.level).canonical_score(&evaluations) else {
            return Ok(submission);
        };

        submission.average_score = Some(canonical);
        if !submission.status.is_terminal() && !submission.disqualified {
            submission.status = SubmissionStatus::Evaluated;
        }
        let submission = store.update_submission(submission).await?;

        broadcaster.publish(
            &leaderboard_channel(submission.year, submission.level),
            RealtimeEvent::ScoreUpdated {
                submission_id: submission.id,
                average_score: canonical,
            },
        );

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::Duration;

    use crate::events::NoopBroadcaster;
    use crate::models::{Level, SubmissionAssignment};
    use crate::store::{AssignmentStore, EvaluationStore, MemoryStore, RoundStore, SubmissionStore};
    use crate::testing::{new_round, new_submission};

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn input(pairs: &[(&str, f64)]) -> EvaluationInput {
        EvaluationInput {
            scores: scores(pairs),
            comments: None,
        }
    }

    async fn seed_round(store: &MemoryStore, level: Level) {
        let (region, council) = match level {
            Level::Council => (Some("north"), Some("hilltop")),
            Level::Regional => (Some("north"), None),
            Level::National => (None, None),
        };
        store
            .create_round(new_round(level, region, council))
            .await
            .unwrap();
    }

    async fn assign(store: &MemoryStore, submission: &Submission, judge_id: Uuid) {
        store
            .create_assignment(SubmissionAssignment {
                id: Uuid::new_v4(),
                submission_id: submission.id,
                judge_id,
                level: submission.level,
                region: submission.region.clone(),
                council: submission.council.clone(),
                judge_notified: true,
                assigned_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_council_canonical_score_is_sole_average() {
        let store = MemoryStore::new();
        seed_round(&store, Level::Council).await;
        let submission = new_submission(Level::Council, Some("north"), Some("hilltop"));
        store.create_submission(submission.clone()).await.unwrap();
        let judge_id = Uuid::new_v4();
        assign(&store, &submission, judge_id).await;

        let evaluation = ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &judge_id,
            input(&[("clarity", 80.0), ("rigor", 87.5)]),
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(evaluation.total_score, 167.5);
        assert_eq!(evaluation.average_score, 83.75);

        let stored = store.find_submission(&submission.id).await.unwrap().unwrap();
        assert_eq!(stored.average_score, Some(83.75));
        assert_eq!(stored.status, SubmissionStatus::Evaluated);
    }

    #[tokio::test]
    async fn test_judge_revision_upserts_not_duplicates() {
        let store = MemoryStore::new();
        seed_round(&store, Level::Council).await;
        let submission = new_submission(Level::Council, Some("north"), Some("hilltop"));
        store.create_submission(submission.clone()).await.unwrap();
        let judge_id = Uuid::new_v4();
        assign(&store, &submission, judge_id).await;

        ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &judge_id,
            input(&[("clarity", 60.0)]),
            Utc::now(),
        )
        .await
        .unwrap();
        ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &judge_id,
            input(&[("clarity", 75.0)]),
            Utc::now(),
        )
        .await
        .unwrap();

        let evaluations = store.evaluations_for(&submission.id).await.unwrap();
        assert_eq!(evaluations.len(), 1);
        assert_eq!(evaluations[0].average_score, 75.0);

        let stored = store.find_submission(&submission.id).await.unwrap().unwrap();
        assert_eq!(stored.average_score, Some(75.0));
    }

    #[tokio::test]
    async fn test_unassigned_judge_is_rejected() {
        let store = MemoryStore::new();
        seed_round(&store, Level::Council).await;
        let submission = new_submission(Level::Council, Some("north"), Some("hilltop"));
        store.create_submission(submission.clone()).await.unwrap();
        assign(&store, &submission, Uuid::new_v4()).await;

        let intruder = Uuid::new_v4();
        let err = ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &intruder,
            input(&[("clarity", 90.0)]),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotEligible(_)));
    }

    #[tokio::test]
    async fn test_national_mean_is_rounded_to_two_places() {
        let store = MemoryStore::new();
        seed_round(&store, Level::National).await;
        let submission = new_submission(Level::National, None, None);
        store.create_submission(submission.clone()).await.unwrap();

        for average in [80.0, 85.0, 91.0] {
            ScoringService::record_evaluation(
                &store,
                &NoopBroadcaster,
                &submission.id,
                &Uuid::new_v4(),
                input(&[("overall", average)]),
                Utc::now(),
            )
            .await
            .unwrap();
        }

        let stored = store.find_submission(&submission.id).await.unwrap().unwrap();
        // mean(80, 85, 91) = 85.333... -> 85.33
        assert_eq!(stored.average_score, Some(85.33));
        assert_eq!(stored.status, SubmissionStatus::Evaluated);
    }

    #[tokio::test]
    async fn test_rejected_when_round_window_closed() {
        let store = MemoryStore::new();
        let mut round = new_round(Level::National, None, None);
        round.end_time = Some(Utc::now() - Duration::minutes(1));
        store.create_round(round).await.unwrap();

        let submission = new_submission(Level::National, None, None);
        store.create_submission(submission.clone()).await.unwrap();

        let err = ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &Uuid::new_v4(),
            input(&[("overall", 70.0)]),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_recompute_never_demotes_terminal_status() {
        let store = MemoryStore::new();
        let mut submission = new_submission(Level::National, None, None);
        submission.status = SubmissionStatus::Promoted;
        submission.average_score = Some(90.0);
        store.create_submission(submission.clone()).await.unwrap();

        store
            .upsert_evaluation(Evaluation {
                id: Uuid::new_v4(),
                submission_id: submission.id,
                judge_id: Uuid::new_v4(),
                scores: scores(&[("overall", 50.0)]),
                comments: None,
                total_score: 50.0,
                average_score: 50.0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let updated = ScoringService::recompute(&store, &NoopBroadcaster, submission)
            .await
            .unwrap();
        assert_eq!(updated.status, SubmissionStatus::Promoted);
        // Score still tracks the evaluations
        assert_eq!(updated.average_score, Some(50.0));
    }

    #[tokio::test]
    async fn test_malformed_scores_rejected() {
        let store = MemoryStore::new();
        let submission = new_submission(Level::National, None, None);
        store.create_submission(submission.clone()).await.unwrap();

        let err = ScoringService::record_evaluation(
            &store,
            &NoopBroadcaster,
            &submission.id,
            &Uuid::new_v4(),
            input(&[]),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
