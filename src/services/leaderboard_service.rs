//! Leaderboard service
//!
//! Materializes the ranking for a (year, areaOfFocus, level, locationKey)
//! scope. Rankings are a pure function of current evaluation data, so
//! rebuilds are idempotent and safe to race: the last writer for a key wins
//! and a stale read self-corrects on the next rebuild. Readers go through
//! [`LeaderboardService::get`], which honors a frozen round before touching
//! live data.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::CONFIG,
    error::AppResult,
    models::{
        assign_competition_ranks, Leaderboard, LeaderboardEntry, LeaderboardKey,
        LeaderboardSnapshot, LeaderboardVisibility, Level, LocationKey, SubmissionStatus,
    },
    services::RoundService,
    store::{Store, SubmissionFilter},
};

/// Leaderboard service
pub struct LeaderboardService;

impl LeaderboardService {
    /// Build and persist the leaderboard for a scope from current
    /// evaluation data. Disqualified submissions never enter the ranking.
    /// A finalized board is returned as-is; advancement already fixed it.
    pub async fn build(
        store: &dyn Store,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
        quota: Option<u32>,
    ) -> AppResult<Leaderboard> {
        let key = LeaderboardKey::new(year, area_of_focus, level, location_key);
        let existing = store.find_leaderboard(&key).await?;
        if let Some(board) = &existing {
            if board.is_finalized {
                return Ok(board.clone());
            }
        }

        let quota = quota
            .or(existing.as_ref().map(|b| b.quota))
            .unwrap_or(CONFIG.engine.default_quota);

        let submissions = store
            .query_submissions(&SubmissionFilter {
                year: Some(year),
                level: Some(level),
                area_of_focus: Some(area_of_focus.to_string()),
                statuses: Some(vec![
                    SubmissionStatus::Evaluated,
                    SubmissionStatus::Promoted,
                    SubmissionStatus::Eliminated,
                ]),
                include_disqualified: false,
                ..SubmissionFilter::default()
            })
            .await?;

        let mut ranked: Vec<(f64, LeaderboardEntry)> = submissions
            .into_iter()
            .filter(|s| s.location_key().encode() == location_key)
            .filter_map(|s| {
                let score = s.average_score?;
                Some((
                    score,
                    LeaderboardEntry {
                        submission_id: s.id,
                        rank: 0,
                        average_score: score,
                        status: s.status,
                    },
                ))
            })
            .collect();
        // Descending score; the query's (submitted_at, id) order breaks ties
        // deterministically via the stable sort
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut entries: Vec<LeaderboardEntry> = ranked.into_iter().map(|(_, e)| e).collect();
        assign_competition_ranks(&mut entries);

        let board = Leaderboard {
            id: existing.map(|b| b.id).unwrap_or_else(Uuid::new_v4),
            year,
            area_of_focus: area_of_focus.to_string(),
            level,
            location_key: location_key.to_string(),
            total_submissions: entries.len() as u32,
            entries,
            quota,
            is_finalized: false,
            generated_at: Utc::now(),
        };
        store.upsert_leaderboard(board).await
    }

    /// Read the leaderboard a viewer should see: the governing round's
    /// frozen snapshot when visibility is frozen, the live ranking
    /// otherwise.
    pub async fn get(
        store: &dyn Store,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
    ) -> AppResult<Leaderboard> {
        let location = LocationKey::decode(level, location_key);
        let round = RoundService::governing_round(
            store,
            year,
            level,
            location.region.as_deref(),
            location.council.as_deref(),
        )
        .await?;

        if let Some(round) = round {
            if round.leaderboard_visibility == LeaderboardVisibility::Frozen {
                if let Some(snapshot) = &round.frozen_snapshot {
                    let snapshot_key = LeaderboardSnapshot::key(area_of_focus, location_key);
                    if let Some(entries) = snapshot.locations.get(&snapshot_key) {
                        return Ok(Self::from_snapshot(
                            store,
                            year,
                            area_of_focus,
                            level,
                            location_key,
                            snapshot,
                            entries.clone(),
                        )
                        .await?);
                    }
                }
            }
        }

        Self::build(store, year, area_of_focus, level, location_key, None).await
    }

    /// Materialize a read-only view over frozen entries
    async fn from_snapshot(
        store: &dyn Store,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
        snapshot: &LeaderboardSnapshot,
        entries: Vec<LeaderboardEntry>,
    ) -> AppResult<Leaderboard> {
        let key = LeaderboardKey::new(year, area_of_focus, level, location_key);
        let quota = store
            .find_leaderboard(&key)
            .await?
            .map(|b| b.quota)
            .unwrap_or(CONFIG.engine.default_quota);

        Ok(Leaderboard {
            id: Uuid::new_v4(),
            year,
            area_of_focus: area_of_focus.to_string(),
            level,
            location_key: location_key.to_string(),
            total_submissions: entries.len() as u32,
            entries,
            quota,
            is_finalized: false,
            generated_at: snapshot.frozen_at,
        })
    }
}
