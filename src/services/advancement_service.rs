//! Advancement service
//!
//! Applies promotion/elimination quotas to a location's leaderboard and
//! aggregates advancement across every location of a (year, areaOfFocus,
//! level) combination. Only submissions still in `evaluated` status are
//! touched, which makes re-running advancement idempotent rather than
//! strictly serialized.

use futures::future::join_all;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    events::{notify_best_effort, Notifier},
    models::{
        CompetitionRound, Leaderboard, LeaderboardEntry, Level, Notification, Submission,
        SubmissionStatus, TieBreak,
    },
    services::{LeaderboardService, RoundService, TieBreakService},
    store::Store,
};

/// Result of advancing one location
#[derive(Debug, Clone)]
pub struct LocationAdvancement {
    pub location_key: String,
    pub promoted: Vec<Uuid>,
    pub eliminated: Vec<Uuid>,
    /// Set when a boundary tie suspended part of the advancement
    pub tie_break_id: Option<Uuid>,
}

impl LocationAdvancement {
    fn suspended(location_key: &str, tie_break_id: Uuid) -> Self {
        Self {
            location_key: location_key.to_string(),
            promoted: Vec::new(),
            eliminated: Vec::new(),
            tie_break_id: Some(tie_break_id),
        }
    }
}

/// Aggregated result of advancing every location
#[derive(Debug, Default)]
pub struct GlobalAdvancement {
    pub promoted: u32,
    pub eliminated: u32,
    pub locations: Vec<LocationAdvancement>,
    /// Locations suspended on a boundary tie
    pub tie_break_locations: Vec<String>,
    /// Locations whose advancement failed, with the error message
    pub failed_locations: Vec<(String, String)>,
}

/// Advancement service
pub struct AdvancementService;

impl AdvancementService {
    /// Advance a single location: entries ranked within the quota are
    /// promoted, the rest eliminated. A tie group straddling the quota
    /// boundary suspends advancement for exactly that group and opens a
    /// tie-break over it.
    pub async fn advance_location(
        store: &dyn Store,
        notifier: &dyn Notifier,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
        quota: Option<u32>,
    ) -> AppResult<LocationAdvancement> {
        // A pending tie-break keeps the location suspended
        if let Some(open) = store
            .open_tie_break_for(year, area_of_focus, level, location_key)
            .await?
        {
            return Ok(LocationAdvancement::suspended(location_key, open.id));
        }

        let board =
            LeaderboardService::build(store, year, area_of_focus, level, location_key, quota)
                .await?;

        // Quota slots already consumed by earlier runs stay consumed
        let already_promoted = board
            .entries
            .iter()
            .filter(|e| e.status == SubmissionStatus::Promoted)
            .count() as u32;
        let remaining_quota = board.quota.saturating_sub(already_promoted);

        let candidates: Vec<&LeaderboardEntry> = board
            .entries
            .iter()
            .filter(|e| e.status == SubmissionStatus::Evaluated)
            .collect();

        let mut promoted = Vec::new();
        let mut eliminated = Vec::new();
        let mut tie_break: Option<TieBreak> = None;

        let mut index = 0;
        while index < candidates.len() {
            // Tie group: consecutive candidates with equal canonical score
            let group_score = candidates[index].average_score;
            let mut group_end = index + 1;
            while group_end < candidates.len()
                && candidates[group_end].average_score == group_score
            {
                group_end += 1;
            }
            let group: Vec<Uuid> = candidates[index..group_end]
                .iter()
                .map(|e| e.submission_id)
                .collect();

            if tie_break.is_some() || promoted.len() as u32 >= remaining_quota {
                eliminated.extend(group);
            } else if (promoted.len() + group.len()) as u32 <= remaining_quota {
                promoted.extend(group);
            } else {
                // The group straddles the boundary: suspend it
                let slots = remaining_quota - promoted.len() as u32;
                let opened = TieBreakService::open(
                    store,
                    year,
                    area_of_focus,
                    level,
                    location_key,
                    group,
                    slots,
                )
                .await?;
                tracing::info!(
                    location_key,
                    tie_break_id = %opened.id,
                    slots,
                    "advancement suspended on boundary tie"
                );
                tie_break = Some(opened);
            }
            index = group_end;
        }

        for id in &promoted {
            Self::transition(store, notifier, id, SubmissionStatus::Promoted).await?;
        }
        for id in &eliminated {
            Self::transition(store, notifier, id, SubmissionStatus::Eliminated).await?;
        }

        let tie_break_id = tie_break.map(|t| t.id);
        Self::refresh_board(store, board, tie_break_id.is_none()).await?;

        Ok(LocationAdvancement {
            location_key: location_key.to_string(),
            promoted,
            eliminated,
            tie_break_id,
        })
    }

    /// Advance every known location for (year, areaOfFocus, level). One
    /// location failing does not abort the others; the aggregate enumerates
    /// failures and tie-break suspensions explicitly.
    pub async fn advance_global(
        store: &dyn Store,
        notifier: &dyn Notifier,
        year: i32,
        area_of_focus: &str,
        level: Level,
        quota: Option<u32>,
    ) -> AppResult<GlobalAdvancement> {
        let keys = store.location_keys(year, area_of_focus, level).await?;

        let results = join_all(keys.iter().map(|key| {
            Self::advance_location(store, notifier, year, area_of_focus, level, key, quota)
        }))
        .await;

        let mut aggregate = GlobalAdvancement::default();
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(outcome) => {
                    aggregate.promoted += outcome.promoted.len() as u32;
                    aggregate.eliminated += outcome.eliminated.len() as u32;
                    if outcome.tie_break_id.is_some() {
                        aggregate.tie_break_locations.push(key);
                    }
                    aggregate.locations.push(outcome);
                }
                Err(e) => {
                    tracing::error!(location_key = %key, "advancement failed: {}", e);
                    aggregate.failed_locations.push((key, e.to_string()));
                }
            }
        }
        Ok(aggregate)
    }

    /// Advance every (areaOfFocus, location) combination inside a round's
    /// scope, used by the auto-advance path when a round ends.
    pub async fn advance_round_scope(
        store: &dyn Store,
        notifier: &dyn Notifier,
        round: &CompetitionRound,
    ) -> AppResult<Vec<LocationAdvancement>> {
        let submissions = store
            .query_submissions(&RoundService::scope_filter(round))
            .await?;
        let mut scopes: Vec<(String, String)> = submissions
            .iter()
            .map(|s| (s.area_of_focus.clone(), s.location_key().encode()))
            .collect();
        scopes.sort();
        scopes.dedup();

        let mut outcomes = Vec::new();
        for (area, location_key) in scopes {
            match Self::advance_location(
                store,
                notifier,
                round.year,
                &area,
                round.level,
                &location_key,
                None,
            )
            .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(
                        round_id = %round.id,
                        location_key,
                        "auto-advance failed for location: {}",
                        e
                    );
                }
            }
        }
        Ok(outcomes)
    }

    /// Complete a suspended advancement from a resolved tie-break: winners
    /// are promoted, the remaining tied submissions eliminated.
    pub async fn apply_tie_break(
        store: &dyn Store,
        notifier: &dyn Notifier,
        tie_break_id: &Uuid,
    ) -> AppResult<LocationAdvancement> {
        let tie_break = store
            .find_tie_break(tie_break_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tie-break {} not found", tie_break_id)))?;
        if tie_break.resolved_at.is_none() {
            return Err(AppError::InvalidState(format!(
                "tie-break {} is not resolved yet",
                tie_break.id
            )));
        }

        let mut promoted = Vec::new();
        let mut eliminated = Vec::new();
        for id in &tie_break.submission_ids {
            let target = if tie_break.winners.contains(id) {
                SubmissionStatus::Promoted
            } else {
                SubmissionStatus::Eliminated
            };
            if Self::transition(store, notifier, id, target).await? {
                match target {
                    SubmissionStatus::Promoted => promoted.push(*id),
                    _ => eliminated.push(*id),
                }
            }
        }

        let board = LeaderboardService::build(
            store,
            tie_break.year,
            &tie_break.area_of_focus,
            tie_break.level,
            &tie_break.location_key,
            None,
        )
        .await?;
        Self::refresh_board(store, board, true).await?;

        Ok(LocationAdvancement {
            location_key: tie_break.location_key.clone(),
            promoted,
            eliminated,
            tie_break_id: Some(tie_break.id),
        })
    }

    /// Move a submission still in evaluated status to its advancement
    /// outcome. Returns false when the submission was already settled.
    async fn transition(
        store: &dyn Store,
        notifier: &dyn Notifier,
        submission_id: &Uuid,
        target: SubmissionStatus,
    ) -> AppResult<bool> {
        let Some(submission) = store.find_submission(submission_id).await? else {
            tracing::error!(submission_id = %submission_id, "submission vanished mid-advancement");
            return Ok(false);
        };
        if submission.status != SubmissionStatus::Evaluated {
            return Ok(false);
        }

        let submission = store
            .update_submission(Submission {
                status: target,
                ..submission
            })
            .await?;

        let notification = match target {
            SubmissionStatus::Promoted => Notification::SubmissionPromoted {
                submission_id: submission.id,
                teacher_id: submission.teacher_id,
                level: submission.level,
            },
            _ => Notification::SubmissionEliminated {
                submission_id: submission.id,
                teacher_id: submission.teacher_id,
                level: submission.level,
            },
        };
        notify_best_effort(notifier, notification).await;
        Ok(true)
    }

    /// Re-materialize the board so entry statuses reflect the advancement,
    /// finalizing it once no tie-break remains.
    async fn refresh_board(
        store: &dyn Store,
        board: Leaderboard,
        finalize: bool,
    ) -> AppResult<()> {
        let mut board = LeaderboardService::build(
            store,
            board.year,
            &board.area_of_focus,
            board.level,
            &board.location_key,
            Some(board.quota),
        )
        .await?;
        if finalize && !board.is_finalized && !board.entries.is_empty() {
            board.is_finalized = true;
            store.upsert_leaderboard(board).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogNotifier;
    use crate::models::TieBreakStatus;
    use crate::store::{MemoryStore, SubmissionStore, TieBreakStore};
    use crate::testing::new_submission;

    async fn seed_scored(store: &MemoryStore, score: f64) -> Submission {
        let mut submission = new_submission(Level::Council, Some("north"), Some("hilltop"));
        submission.status = SubmissionStatus::Evaluated;
        submission.average_score = Some(score);
        store.create_submission(submission.clone()).await.unwrap();
        submission
    }

    async fn status_of(store: &MemoryStore, id: &Uuid) -> SubmissionStatus {
        store.find_submission(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_clean_cutoff_promotes_and_eliminates() {
        let store = MemoryStore::new();
        let a = seed_scored(&store, 90.0).await;
        let b = seed_scored(&store, 85.0).await;
        let c = seed_scored(&store, 80.0).await;

        let outcome = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(2),
        )
        .await
        .unwrap();

        assert_eq!(outcome.promoted, vec![a.id, b.id]);
        assert_eq!(outcome.eliminated, vec![c.id]);
        assert!(outcome.tie_break_id.is_none());

        assert_eq!(status_of(&store, &a.id).await, SubmissionStatus::Promoted);
        assert_eq!(status_of(&store, &c.id).await, SubmissionStatus::Eliminated);

        let board = LeaderboardService::build(
            &store,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            None,
        )
        .await
        .unwrap();
        assert!(board.is_finalized);
    }

    #[tokio::test]
    async fn test_boundary_tie_suspends_the_tied_group() {
        let store = MemoryStore::new();
        let a = seed_scored(&store, 90.0).await;
        let b = seed_scored(&store, 85.0).await;
        let c = seed_scored(&store, 85.0).await;
        let d = seed_scored(&store, 80.0).await;

        let outcome = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(2),
        )
        .await
        .unwrap();

        // A is unambiguous, D is unambiguously out, B/C go to a vote
        assert_eq!(outcome.promoted, vec![a.id]);
        assert_eq!(outcome.eliminated, vec![d.id]);
        let tie_break_id = outcome.tie_break_id.expect("tie-break expected");

        let tie_break = store.find_tie_break(&tie_break_id).await.unwrap().unwrap();
        assert_eq!(tie_break.quota, 1);
        let mut tied = tie_break.submission_ids.clone();
        tied.sort();
        let mut expected = vec![b.id, c.id];
        expected.sort();
        assert_eq!(tied, expected);

        assert_eq!(status_of(&store, &b.id).await, SubmissionStatus::Evaluated);
        assert_eq!(status_of(&store, &c.id).await, SubmissionStatus::Evaluated);
    }

    #[tokio::test]
    async fn test_rerun_is_a_noop_once_fully_advanced() {
        let store = MemoryStore::new();
        seed_scored(&store, 90.0).await;
        seed_scored(&store, 80.0).await;

        let first = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(1),
        )
        .await
        .unwrap();
        assert_eq!(first.promoted.len(), 1);
        assert_eq!(first.eliminated.len(), 1);

        let rerun = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(1),
        )
        .await
        .unwrap();
        assert!(rerun.promoted.is_empty());
        assert!(rerun.eliminated.is_empty());
    }

    #[tokio::test]
    async fn test_rerun_while_tie_break_open_stays_suspended() {
        let store = MemoryStore::new();
        seed_scored(&store, 85.0).await;
        seed_scored(&store, 85.0).await;

        let first = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(1),
        )
        .await
        .unwrap();
        let tie_break_id = first.tie_break_id.unwrap();

        let rerun = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(1),
        )
        .await
        .unwrap();
        assert_eq!(rerun.tie_break_id, Some(tie_break_id));
        assert!(rerun.promoted.is_empty());
    }

    #[tokio::test]
    async fn test_apply_tie_break_completes_the_advancement() {
        let store = MemoryStore::new();
        let a = seed_scored(&store, 85.0).await;
        let b = seed_scored(&store, 85.0).await;

        let outcome = AdvancementService::advance_location(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            "north/hilltop",
            Some(1),
        )
        .await
        .unwrap();
        let tie_break_id = outcome.tie_break_id.unwrap();

        // Resolve the vote in favor of a
        let mut tie_break = store.find_tie_break(&tie_break_id).await.unwrap().unwrap();
        tie_break.status = TieBreakStatus::Resolved;
        tie_break.winners = vec![a.id];
        tie_break.resolved_at = Some(chrono::Utc::now());
        store.update_tie_break(tie_break).await.unwrap();

        let completed =
            AdvancementService::apply_tie_break(&store, &LogNotifier, &tie_break_id)
                .await
                .unwrap();
        assert_eq!(completed.promoted, vec![a.id]);
        assert_eq!(completed.eliminated, vec![b.id]);

        assert_eq!(status_of(&store, &a.id).await, SubmissionStatus::Promoted);
        assert_eq!(status_of(&store, &b.id).await, SubmissionStatus::Eliminated);
    }

    #[tokio::test]
    async fn test_global_advancement_aggregates_locations() {
        let store = MemoryStore::new();

        // Two councils in the same region
        for score in [90.0, 80.0] {
            let mut s = new_submission(Level::Council, Some("north"), Some("hilltop"));
            s.status = SubmissionStatus::Evaluated;
            s.average_score = Some(score);
            store.create_submission(s).await.unwrap();
        }
        for score in [70.0, 60.0, 50.0] {
            let mut s = new_submission(Level::Council, Some("north"), Some("riverside"));
            s.status = SubmissionStatus::Evaluated;
            s.average_score = Some(score);
            store.create_submission(s).await.unwrap();
        }

        let aggregate = AdvancementService::advance_global(
            &store,
            &LogNotifier,
            2026,
            "literacy",
            Level::Council,
            Some(1),
        )
        .await
        .unwrap();

        assert_eq!(aggregate.promoted, 2);
        assert_eq!(aggregate.eliminated, 3);
        assert_eq!(aggregate.locations.len(), 2);
        assert!(aggregate.failed_locations.is_empty());
        assert!(aggregate.tie_break_locations.is_empty());
    }
}
