//! Round lifecycle service
//!
//! Owns the `pending → active → ended → closed` state machine, the effective
//! end-time computation, the best-active-round matching rule for submissions
//! without an explicit round id, the frozen/live leaderboard toggle, and the
//! periodic sweep an external scheduler drives.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    config::CONFIG,
    constants::match_priority,
    error::{AppError, AppResult},
    events::{notify_best_effort, Broadcaster, Notifier},
    models::{
        leaderboard_channel, CompetitionRound, LeaderboardSnapshot, LeaderboardVisibility, Level,
        Notification, RealtimeEvent, RoundStatus, Submission, SubmissionStatus, TimingType,
    },
    services::{AdvancementService, LeaderboardService},
    store::{Store, SubmissionFilter},
};

/// Parameters for creating a round
#[derive(Debug, Clone)]
pub struct CreateRoundRequest {
    pub year: i32,
    pub level: Level,
    pub region: Option<String>,
    pub council: Option<String>,
    pub timing_type: TimingType,
    pub end_time: Option<DateTime<Utc>>,
    pub countdown_minutes: Option<i64>,
    pub auto_advance: bool,
    pub wait_for_all_judges: bool,
}

/// Outcome of one scheduler sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    pub ending_soon: Vec<Uuid>,
    pub ended: Vec<Uuid>,
    pub advanced: Vec<Uuid>,
}

/// Round lifecycle service
pub struct RoundService;

impl RoundService {
    /// Create a round in pending status
    pub async fn create(
        store: &dyn Store,
        payload: CreateRoundRequest,
    ) -> AppResult<CompetitionRound> {
        if payload.timing_type == TimingType::FixedTime && payload.end_time.is_none() {
            return Err(AppError::Validation(
                "fixed_time rounds require an end time".to_string(),
            ));
        }

        let countdown_minutes = match payload.timing_type {
            TimingType::Countdown => Some(
                payload
                    .countdown_minutes
                    .unwrap_or(CONFIG.engine.default_countdown_minutes),
            ),
            TimingType::FixedTime => None,
        };

        let round = CompetitionRound {
            id: Uuid::new_v4(),
            year: payload.year,
            level: payload.level,
            region: payload.region,
            council: payload.council,
            status: RoundStatus::Pending,
            timing_type: payload.timing_type,
            end_time: payload.end_time,
            start_time: None,
            countdown_minutes,
            auto_advance: payload.auto_advance,
            wait_for_all_judges: payload.wait_for_all_judges,
            leaderboard_visibility: LeaderboardVisibility::Live,
            frozen_snapshot: None,
            pending_submission_snapshot: Vec::new(),
            ending_soon_notified: false,
            advanced_at: None,
            created_at: Utc::now(),
            closed_at: None,
            closed_by: None,
        };

        store.create_round(round).await
    }

    /// Activate a pending round: capture the pending-submission snapshot,
    /// start the countdown clock, announce the opening.
    pub async fn activate(
        store: &dyn Store,
        notifier: &dyn Notifier,
        broadcaster: &dyn Broadcaster,
        round_id: &Uuid,
    ) -> AppResult<CompetitionRound> {
        let mut round = Self::require_round(store, round_id).await?;
        if round.status != RoundStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "round {} is {}, only pending rounds can be activated",
                round.id, round.status
            )));
        }

        let pending = store
            .query_submissions(&SubmissionFilter {
                statuses: Some(vec![SubmissionStatus::Pending]),
                ..Self::scope_filter(&round)
            })
            .await?;

        round.status = RoundStatus::Active;
        round.pending_submission_snapshot = pending.iter().map(|s| s.id).collect();
        if round.timing_type == TimingType::Countdown {
            round.start_time = Some(Utc::now());
        }
        let round = store.update_round(round).await?;

        tracing::info!(
            round_id = %round.id,
            level = %round.level,
            pending = round.pending_submission_snapshot.len(),
            "round activated"
        );

        notify_best_effort(
            notifier,
            Notification::RoundStarted {
                round_id: round.id,
                year: round.year,
                level: round.level,
            },
        )
        .await;
        Self::broadcast_state(broadcaster, &round);

        Ok(round)
    }

    /// Close an ended round. `force` lets an administrator close a pending
    /// or active round that has not reached its effective end yet.
    pub async fn close(
        store: &dyn Store,
        notifier: &dyn Notifier,
        broadcaster: &dyn Broadcaster,
        round_id: &Uuid,
        actor: &Uuid,
        force: bool,
    ) -> AppResult<CompetitionRound> {
        let mut round = Self::require_round(store, round_id).await?;
        match round.status {
            RoundStatus::Ended => {}
            RoundStatus::Active | RoundStatus::Pending if force => {}
            RoundStatus::Closed => {
                return Err(AppError::InvalidState(format!(
                    "round {} is already closed",
                    round.id
                )));
            }
            status => {
                return Err(AppError::InvalidState(format!(
                    "round {} is {}, only ended rounds can be closed",
                    round.id, status
                )));
            }
        }

        // A forced close cuts the evaluation window short
        let window_cut_short = round.status == RoundStatus::Active;
        round.status = RoundStatus::Closed;
        round.closed_at = Some(Utc::now());
        round.closed_by = Some(*actor);
        let round = store.update_round(round).await?;

        tracing::info!(round_id = %round.id, closed_by = %actor, "round closed");
        if window_cut_short {
            notify_best_effort(notifier, Notification::RoundEnded { round_id: round.id }).await;
        }
        Self::broadcast_state(broadcaster, &round);
        Ok(round)
    }

    /// Toggle leaderboard visibility. Freezing captures the currently
    /// computed leaderboard of every location in the round's scope; going
    /// back to live discards the snapshot.
    pub async fn set_leaderboard_visibility(
        store: &dyn Store,
        broadcaster: &dyn Broadcaster,
        round_id: &Uuid,
        visibility: LeaderboardVisibility,
    ) -> AppResult<CompetitionRound> {
        let mut round = Self::require_round(store, round_id).await?;
        if round.status == RoundStatus::Closed {
            return Err(AppError::InvalidState(format!(
                "round {} is closed",
                round.id
            )));
        }

        round.frozen_snapshot = match visibility {
            LeaderboardVisibility::Frozen => Some(Self::capture_snapshot(store, &round).await?),
            LeaderboardVisibility::Live => None,
        };
        round.leaderboard_visibility = visibility;
        let round = store.update_round(round).await?;

        broadcaster.publish(
            &leaderboard_channel(round.year, round.level),
            RealtimeEvent::LeaderboardModeChanged {
                round_id: round.id,
                visibility: match visibility {
                    LeaderboardVisibility::Live => "live".to_string(),
                    LeaderboardVisibility::Frozen => "frozen".to_string(),
                },
            },
        );

        Ok(round)
    }

    /// Priority of a round as a match for a submission without an explicit
    /// round id. `None` means the round cannot host the submission.
    pub fn match_priority(round: &CompetitionRound, submission: &Submission) -> Option<u8> {
        if round.status != RoundStatus::Active || round.level != submission.level {
            return None;
        }
        if round.year != submission.year {
            return None;
        }

        let nationwide = round.region.is_none() && round.council.is_none();
        match submission.level {
            Level::Council => {
                if round.region.is_some()
                    && round.region == submission.region
                    && round.council.is_some()
                    && round.council == submission.council
                {
                    Some(match_priority::EXACT_LOCATION)
                } else if round.council.is_none()
                    && round.region.is_some()
                    && round.region == submission.region
                {
                    Some(match_priority::COUNCIL_REGION_ONLY)
                } else if nationwide {
                    Some(match_priority::COUNCIL_FALLBACK)
                } else {
                    None
                }
            }
            Level::Regional => {
                if round.region.is_some() && round.region == submission.region {
                    Some(match_priority::REGIONAL_EXACT_REGION)
                } else if nationwide {
                    Some(match_priority::REGIONAL_FALLBACK)
                } else {
                    None
                }
            }
            Level::National => {
                if nationwide {
                    Some(match_priority::NATIONAL_NATIONWIDE)
                } else {
                    Some(match_priority::NATIONAL_FALLBACK)
                }
            }
        }
    }

    /// Best active round for a submission: highest priority wins, ties keep
    /// the most recently created round.
    pub async fn best_round_for(
        store: &dyn Store,
        submission: &Submission,
    ) -> AppResult<Option<CompetitionRound>> {
        let rounds = store.active_rounds().await?;

        let mut best: Option<(u8, CompetitionRound)> = None;
        for round in rounds {
            if let Some(priority) = Self::match_priority(&round, submission) {
                // Rounds come newest-first: strictly-greater keeps first seen
                if best.as_ref().is_none_or(|(p, _)| priority > *p) {
                    best = Some((priority, round));
                }
            }
        }
        Ok(best.map(|(_, round)| round))
    }

    /// The active round currently governing a (year, level, location) scope,
    /// used by leaderboard readers to honor a freeze. Among covering rounds
    /// the most location-specific wins, ties keep the most recently created,
    /// mirroring the submission matching rule.
    pub async fn governing_round(
        store: &dyn Store,
        year: i32,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Option<CompetitionRound>> {
        let rounds = store.active_rounds().await?;

        let mut best: Option<(u8, CompetitionRound)> = None;
        for round in rounds {
            if round.year != year || round.level != level || !round.covers(region, council) {
                continue;
            }
            let specificity = Self::scope_specificity(&round);
            // Rounds come newest-first: strictly-greater keeps first seen
            if best.as_ref().is_none_or(|(s, _)| specificity > *s) {
                best = Some((specificity, round));
            }
        }
        Ok(best.map(|(_, round)| round))
    }

    /// How narrowly a round is scoped: exact location beats region-only
    /// beats nationwide
    fn scope_specificity(round: &CompetitionRound) -> u8 {
        match (&round.region, &round.council) {
            (Some(_), Some(_)) => 2,
            (Some(_), None) => 1,
            _ => 0,
        }
    }

    /// Resolve the round an evaluation write runs under and verify the
    /// window is open. Rejected writes are domain errors, never retried.
    pub async fn ensure_open_for_evaluation(
        store: &dyn Store,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> AppResult<CompetitionRound> {
        let round = match submission.round_id {
            Some(round_id) => Self::require_round(store, &round_id).await?,
            None => Self::best_round_for(store, submission)
                .await?
                .ok_or_else(|| {
                    AppError::InvalidState(format!(
                        "no active round matches submission {}",
                        submission.id
                    ))
                })?,
        };

        if round.status != RoundStatus::Active {
            return Err(AppError::InvalidState(format!(
                "round {} is {}, evaluations are not accepted",
                round.id, round.status
            )));
        }
        if !round.is_open_for_evaluation(now) {
            return Err(AppError::InvalidState(format!(
                "round {} evaluation window has ended",
                round.id
            )));
        }
        Ok(round)
    }

    /// Scheduler hook: emit ending-soon warnings, end elapsed rounds, and
    /// auto-advance every ended round that has not advanced yet.
    pub async fn sweep(
        store: &dyn Store,
        notifier: &dyn Notifier,
        broadcaster: &dyn Broadcaster,
        now: DateTime<Utc>,
    ) -> AppResult<SweepReport> {
        let mut report = SweepReport::default();
        let lead = Duration::minutes(CONFIG.engine.ending_soon_lead_minutes);

        for round in store.active_rounds().await? {
            if round.should_end(now) {
                let ended = Self::end_round(store, notifier, broadcaster, round).await?;
                report.ended.push(ended.id);
                continue;
            }

            if !round.ending_soon_notified {
                if let Some(end) = round.effective_end_time() {
                    if now + lead >= end {
                        let mut round = round;
                        round.ending_soon_notified = true;
                        let round = store.update_round(round).await?;
                        tracing::info!(
                            round_id = %round.id,
                            remaining = %crate::utils::format_duration(
                                crate::utils::time_until_from(now, end)
                                    .unwrap_or_else(Duration::zero)
                            ),
                            "round ending soon"
                        );
                        notify_best_effort(
                            notifier,
                            Notification::RoundEndingSoon {
                                round_id: round.id,
                                ends_at: end,
                            },
                        )
                        .await;
                        report.ending_soon.push(round.id);
                    }
                }
            }
        }

        // Ended rounds are revisited every sweep until they advance. A
        // wait_for_all_judges round that ended on this very sweep holds
        // back one cycle while unevaluated submissions remain, giving
        // in-flight evaluation writes a chance to commit; the window is
        // closed, so nothing else can shrink the set.
        for round in store.ended_rounds().await? {
            if !round.auto_advance || round.advanced_at.is_some() {
                continue;
            }
            if report.ended.contains(&round.id) && Self::advance_deferred(store, &round).await? {
                tracing::info!(
                    round_id = %round.id,
                    "auto-advance deferred: waiting for all judges"
                );
                continue;
            }

            AdvancementService::advance_round_scope(store, notifier, &round).await?;
            let mut round = round;
            round.advanced_at = Some(now);
            let round = store.update_round(round).await?;
            report.advanced.push(round.id);
        }

        Ok(report)
    }

    /// Transition an active round whose window elapsed to ended
    async fn end_round(
        store: &dyn Store,
        notifier: &dyn Notifier,
        broadcaster: &dyn Broadcaster,
        mut round: CompetitionRound,
    ) -> AppResult<CompetitionRound> {
        round.status = RoundStatus::Ended;
        let round = store.update_round(round).await?;

        tracing::info!(round_id = %round.id, "round ended");
        notify_best_effort(notifier, Notification::RoundEnded { round_id: round.id }).await;
        Self::broadcast_state(broadcaster, &round);
        Ok(round)
    }

    /// True when `wait_for_all_judges` holds advancement back because
    /// matching submissions are still unevaluated
    async fn advance_deferred(store: &dyn Store, round: &CompetitionRound) -> AppResult<bool> {
        if !round.wait_for_all_judges {
            return Ok(false);
        }
        let pending = store
            .query_submissions(&SubmissionFilter {
                statuses: Some(vec![SubmissionStatus::Pending]),
                include_disqualified: false,
                ..Self::scope_filter(round)
            })
            .await?;
        Ok(!pending.is_empty())
    }

    /// Capture the current computed leaderboard of every location in the
    /// round's scope into a frozen snapshot.
    async fn capture_snapshot(
        store: &dyn Store,
        round: &CompetitionRound,
    ) -> AppResult<LeaderboardSnapshot> {
        let submissions = store
            .query_submissions(&SubmissionFilter {
                include_disqualified: false,
                ..Self::scope_filter(round)
            })
            .await?;

        let mut scopes: Vec<(String, String)> = submissions
            .iter()
            .map(|s| (s.area_of_focus.clone(), s.location_key().encode()))
            .collect();
        scopes.sort();
        scopes.dedup();

        let mut snapshot = LeaderboardSnapshot {
            frozen_at: Utc::now(),
            locations: Default::default(),
        };
        for (area, location_key) in scopes {
            let board =
                LeaderboardService::build(store, round.year, &area, round.level, &location_key, None)
                    .await?;
            snapshot
                .locations
                .insert(LeaderboardSnapshot::key(&area, &location_key), board.entries);
        }
        Ok(snapshot)
    }

    /// Submission filter matching the round's scope
    pub fn scope_filter(round: &CompetitionRound) -> SubmissionFilter {
        SubmissionFilter {
            year: Some(round.year),
            level: Some(round.level),
            region: round.region.clone(),
            council: round.council.clone(),
            include_disqualified: true,
            ..SubmissionFilter::default()
        }
    }

    async fn require_round(store: &dyn Store, round_id: &Uuid) -> AppResult<CompetitionRound> {
        store
            .find_round(round_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("round {} not found", round_id)))
    }

    fn broadcast_state(broadcaster: &dyn Broadcaster, round: &CompetitionRound) {
        broadcaster.publish(
            &leaderboard_channel(round.year, round.level),
            RealtimeEvent::RoundStateChanged {
                round_id: round.id,
                status: round.status.to_string(),
            },
        );
    }
}
