//! Competition round model

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::leaderboard::LeaderboardEntry;
use crate::models::submission::Level;

/// Round lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Pending,
    Active,
    Ended,
    Closed,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// How a round's end is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingType {
    /// Absolute `end_time` is authoritative
    FixedTime,
    /// `start_time` (or `created_at`) + `countdown_minutes` is authoritative
    Countdown,
}

/// Leaderboard visibility toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardVisibility {
    Live,
    Frozen,
}

/// Point-in-time ranking capture, keyed by `"{area_of_focus}:{location_key}"`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub frozen_at: DateTime<Utc>,
    pub locations: BTreeMap<String, Vec<LeaderboardEntry>>,
}

impl LeaderboardSnapshot {
    /// Composite key the snapshot map is indexed by
    pub fn key(area_of_focus: &str, location_key: &str) -> String {
        format!("{}:{}", area_of_focus, location_key)
    }
}

/// One evaluation window for a (year, level, optional region, optional
/// council) scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionRound {
    pub id: Uuid,
    pub year: i32,
    pub level: Level,
    pub region: Option<String>,
    pub council: Option<String>,
    pub status: RoundStatus,
    pub timing_type: TimingType,
    pub end_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub countdown_minutes: Option<i64>,
    pub auto_advance: bool,
    pub wait_for_all_judges: bool,
    pub leaderboard_visibility: LeaderboardVisibility,
    pub frozen_snapshot: Option<LeaderboardSnapshot>,
    /// Ids of not-yet-evaluated matching submissions captured at activation
    pub pending_submission_snapshot: Vec<Uuid>,
    pub ending_soon_notified: bool,
    /// Set once auto-advancement has run for this round
    pub advanced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<Uuid>,
}

impl CompetitionRound {
    /// Compute the authoritative end of the evaluation window.
    ///
    /// Fixed-time rounds return `end_time`; countdown rounds anchor on
    /// `start_time` falling back to `created_at`. Returns `None` only for a
    /// fixed-time round that was never given an end time.
    pub fn effective_end_time(&self) -> Option<DateTime<Utc>> {
        match self.timing_type {
            TimingType::FixedTime => self.end_time,
            TimingType::Countdown => {
                let anchor = self.start_time.unwrap_or(self.created_at);
                let minutes = self.countdown_minutes?;
                Some(anchor + Duration::minutes(minutes))
            }
        }
    }

    /// True iff the round is active and its window has elapsed
    pub fn should_end(&self, now: DateTime<Utc>) -> bool {
        self.status == RoundStatus::Active
            && self
                .effective_end_time()
                .is_some_and(|end| now >= end)
    }

    /// True iff evaluations may be recorded against this round right now
    pub fn is_open_for_evaluation(&self, now: DateTime<Utc>) -> bool {
        self.status == RoundStatus::Active && !self.should_end(now)
    }

    /// True iff the round covers the given (region, council) scope
    pub fn covers(&self, region: Option<&str>, council: Option<&str>) -> bool {
        let region_ok = match &self.region {
            Some(r) => region == Some(r.as_str()),
            None => true,
        };
        let council_ok = match &self.council {
            Some(c) => council == Some(c.as_str()),
            None => true,
        };
        region_ok && council_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn round(timing_type: TimingType) -> CompetitionRound {
        CompetitionRound {
            id: Uuid::new_v4(),
            year: 2026,
            level: Level::Regional,
            region: Some("north".to_string()),
            council: None,
            status: RoundStatus::Active,
            timing_type,
            end_time: None,
            start_time: None,
            countdown_minutes: None,
            auto_advance: false,
            wait_for_all_judges: false,
            leaderboard_visibility: LeaderboardVisibility::Live,
            frozen_snapshot: None,
            pending_submission_snapshot: Vec::new(),
            ending_soon_notified: false,
            advanced_at: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            closed_at: None,
            closed_by: None,
        }
    }

    #[test]
    fn test_effective_end_fixed_time() {
        let mut r = round(TimingType::FixedTime);
        let end = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        r.end_time = Some(end);
        assert_eq!(r.effective_end_time(), Some(end));
        // Stable across repeated calls
        assert_eq!(r.effective_end_time(), Some(end));
    }

    #[test]
    fn test_effective_end_countdown_anchors_on_start_time() {
        let mut r = round(TimingType::Countdown);
        r.countdown_minutes = Some(120);
        // No start time yet: anchored on created_at
        assert_eq!(
            r.effective_end_time(),
            Some(r.created_at + Duration::minutes(120))
        );

        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        r.start_time = Some(start);
        assert_eq!(r.effective_end_time(), Some(start + Duration::minutes(120)));
    }

    #[test]
    fn test_should_end_requires_active_status() {
        let mut r = round(TimingType::FixedTime);
        let end = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        r.end_time = Some(end);

        assert!(!r.should_end(end - Duration::seconds(1)));
        assert!(r.should_end(end));
        assert!(r.should_end(end + Duration::hours(1)));

        r.status = RoundStatus::Ended;
        assert!(!r.should_end(end + Duration::hours(1)));
    }

    #[test]
    fn test_covers_scopes() {
        let mut r = round(TimingType::FixedTime);
        assert!(r.covers(Some("north"), None));
        assert!(r.covers(Some("north"), Some("hilltop")));
        assert!(!r.covers(Some("south"), None));

        r.region = None;
        // Nationwide round covers everything
        assert!(r.covers(Some("south"), Some("riverside")));
        assert!(r.covers(None, None));
    }
}
