//! Event payloads emitted by the engine
//!
//! Notification delivery (email/in-app) and real-time fan-out are external
//! collaborators; the engine only produces these typed payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::Level;

/// Durable notification events handed to the notification emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    JudgeAssigned {
        judge_id: Uuid,
        submission_id: Uuid,
        level: Level,
    },
    RoundStarted {
        round_id: Uuid,
        year: i32,
        level: Level,
    },
    RoundEndingSoon {
        round_id: Uuid,
        ends_at: DateTime<Utc>,
    },
    RoundEnded {
        round_id: Uuid,
    },
    SubmissionPromoted {
        submission_id: Uuid,
        teacher_id: Uuid,
        level: Level,
    },
    SubmissionEliminated {
        submission_id: Uuid,
        teacher_id: Uuid,
        level: Level,
    },
}

/// Real-time events pushed through the broadcaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RealtimeEvent {
    ScoreUpdated {
        submission_id: Uuid,
        average_score: f64,
    },
    RoundStateChanged {
        round_id: Uuid,
        status: String,
    },
    LeaderboardModeChanged {
        round_id: Uuid,
        visibility: String,
    },
}

/// Channel a real-time event is scoped to
pub fn leaderboard_channel(year: i32, level: Level) -> String {
    format!("leaderboard:{}:{}", year, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_naming() {
        assert_eq!(
            leaderboard_channel(2026, Level::Regional),
            "leaderboard:2026:regional"
        );
    }

    #[test]
    fn test_notification_serializes_tagged() {
        let n = Notification::RoundEnded {
            round_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "round_ended");
    }

    #[test]
    fn test_realtime_event_serializes_tagged() {
        let e = RealtimeEvent::ScoreUpdated {
            submission_id: Uuid::nil(),
            average_score: 87.5,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "score-updated");
    }
}
