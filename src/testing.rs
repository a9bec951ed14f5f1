//! Shared test fixtures

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::{
    CompetitionRound, Judge, LeaderboardVisibility, Level, RoundStatus, Submission,
    SubmissionStatus, TimingType,
};

/// An active fixed-time round ending a day from now
pub fn new_round(level: Level, region: Option<&str>, council: Option<&str>) -> CompetitionRound {
    CompetitionRound {
        id: Uuid::new_v4(),
        year: 2026,
        level,
        region: region.map(String::from),
        council: council.map(String::from),
        status: RoundStatus::Active,
        timing_type: TimingType::FixedTime,
        end_time: Some(Utc::now() + Duration::days(1)),
        start_time: None,
        countdown_minutes: None,
        auto_advance: false,
        wait_for_all_judges: false,
        leaderboard_visibility: LeaderboardVisibility::Live,
        frozen_snapshot: None,
        pending_submission_snapshot: Vec::new(),
        ending_soon_notified: false,
        advanced_at: None,
        created_at: Utc::now(),
        closed_at: None,
        closed_by: None,
    }
}

/// A pending submission in the "literacy" area
pub fn new_submission(level: Level, region: Option<&str>, council: Option<&str>) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        year: 2026,
        level,
        region: region.map(String::from),
        council: council.map(String::from),
        area_of_focus: "literacy".to_string(),
        round_id: None,
        average_score: None,
        status: SubmissionStatus::Pending,
        disqualified: false,
        submitted_at: Utc::now(),
    }
}

/// An active judge scoped to the given level and location
pub fn new_judge(level: Level, region: Option<&str>, council: Option<&str>) -> Judge {
    Judge {
        id: Uuid::new_v4(),
        name: "Judge".to_string(),
        role: crate::constants::roles::JUDGE.to_string(),
        is_active: true,
        assigned_level: level,
        assigned_region: region.map(String::from),
        assigned_council: council.map(String::from),
        created_at: Utc::now(),
    }
}
