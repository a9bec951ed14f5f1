//! Tie-break service
//!
//! When a tie group straddles an advancement quota boundary, a tie-break
//! opens over exactly the tied submissions: one vote per judge, no
//! revisions, `quota` winners. Resolution may be triggered by an
//! administrator or automatically once every eligible judge has voted.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Level, LocationKey, TieBreak, TieBreakStatus, TieBreakVote},
    store::Store,
};

/// Tie-break service
pub struct TieBreakService;

impl TieBreakService {
    /// Open a tie-break over a tied set. At most one open tie-break may
    /// exist per (year, areaOfFocus, level, locationKey) scope.
    pub async fn open(
        store: &dyn Store,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
        submission_ids: Vec<Uuid>,
        quota: u32,
    ) -> AppResult<TieBreak> {
        if submission_ids.len() < 2 {
            return Err(AppError::Validation(
                "a tie-break needs at least two tied submissions".to_string(),
            ));
        }
        if quota == 0 || quota as usize >= submission_ids.len() {
            return Err(AppError::Validation(format!(
                "tie-break quota {} must select a strict subset of {} tied submissions",
                quota,
                submission_ids.len()
            )));
        }
        if let Some(existing) = store
            .open_tie_break_for(year, area_of_focus, level, location_key)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "tie-break {} is already open for {}",
                existing.id, location_key
            )));
        }

        store
            .create_tie_break(TieBreak {
                id: Uuid::new_v4(),
                year,
                area_of_focus: area_of_focus.to_string(),
                level,
                location_key: location_key.to_string(),
                submission_ids,
                quota,
                votes: Vec::new(),
                status: TieBreakStatus::Open,
                winners: Vec::new(),
                created_at: Utc::now(),
                resolved_at: None,
            })
            .await
    }

    /// Cast a judge's vote for one of the tied submissions
    pub async fn vote(
        store: &dyn Store,
        tie_break_id: &Uuid,
        judge_id: &Uuid,
        submission_id: &Uuid,
    ) -> AppResult<TieBreak> {
        let mut tie_break = Self::require(store, tie_break_id).await?;

        if tie_break.status == TieBreakStatus::Resolved {
            return Err(AppError::InvalidState(format!(
                "tie-break {} is already resolved",
                tie_break.id
            )));
        }
        if !tie_break.includes(submission_id) {
            return Err(AppError::Validation(format!(
                "submission {} is not part of tie-break {}",
                submission_id, tie_break.id
            )));
        }
        if tie_break.has_voted(judge_id) {
            return Err(AppError::DuplicateVote(*judge_id));
        }

        tie_break.votes.push(TieBreakVote {
            judge_id: *judge_id,
            submission_id: *submission_id,
            cast_at: Utc::now(),
        });
        store.update_tie_break(tie_break).await
    }

    /// Resolve the vote: the top `quota` submissions by tally become the
    /// winners and the tie-break turns terminal.
    pub async fn resolve(store: &dyn Store, tie_break_id: &Uuid) -> AppResult<TieBreak> {
        let mut tie_break = Self::require(store, tie_break_id).await?;
        if tie_break.status == TieBreakStatus::Resolved {
            return Err(AppError::InvalidState(format!(
                "tie-break {} is already resolved",
                tie_break.id
            )));
        }

        tie_break.winners = tie_break
            .tally()
            .into_iter()
            .take(tie_break.quota as usize)
            .map(|(id, _)| id)
            .collect();
        tie_break.status = TieBreakStatus::Resolved;
        tie_break.resolved_at = Some(Utc::now());

        tracing::info!(
            tie_break_id = %tie_break.id,
            winners = tie_break.winners.len(),
            "tie-break resolved"
        );
        store.update_tie_break(tie_break).await
    }

    /// Resolve automatically once every eligible judge of the tie-break's
    /// scope has voted. Returns the resolved tie-break, or `None` while
    /// votes are still outstanding.
    pub async fn resolve_if_complete(
        store: &dyn Store,
        tie_break_id: &Uuid,
    ) -> AppResult<Option<TieBreak>> {
        let tie_break = Self::require(store, tie_break_id).await?;
        if tie_break.status == TieBreakStatus::Resolved {
            return Ok(Some(tie_break));
        }

        let location = LocationKey::decode(tie_break.level, &tie_break.location_key);
        let electorate = store
            .active_judges(
                tie_break.level,
                location.region.as_deref(),
                location.council.as_deref(),
            )
            .await?;

        if !electorate.is_empty() && tie_break.votes.len() >= electorate.len() {
            return Ok(Some(Self::resolve(store, tie_break_id).await?));
        }
        Ok(None)
    }

    async fn require(store: &dyn Store, tie_break_id: &Uuid) -> AppResult<TieBreak> {
        store
            .find_tie_break(tie_break_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tie-break {} not found", tie_break_id)))
    }
}
