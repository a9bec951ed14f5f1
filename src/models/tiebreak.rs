//! Tie-break model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::Level;

/// Tie-break lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreakStatus {
    Open,
    Resolved,
}

/// One judge's vote inside a tie-break
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieBreakVote {
    pub judge_id: Uuid,
    pub submission_id: Uuid,
    pub cast_at: DateTime<Utc>,
}

/// Ad hoc vote among judges over a fixed set of tied submissions,
/// selecting `quota` winners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieBreak {
    pub id: Uuid,
    pub year: i32,
    pub area_of_focus: String,
    pub level: Level,
    pub location_key: String,
    pub submission_ids: Vec<Uuid>,
    pub quota: u32,
    pub votes: Vec<TieBreakVote>,
    pub status: TieBreakStatus,
    pub winners: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TieBreak {
    /// True iff the submission is in the tied set under vote
    pub fn includes(&self, submission_id: &Uuid) -> bool {
        self.submission_ids.contains(submission_id)
    }

    /// True iff the judge has already cast a vote
    pub fn has_voted(&self, judge_id: &Uuid) -> bool {
        self.votes.iter().any(|v| v.judge_id == *judge_id)
    }

    /// Tally votes per tied submission, ordered by descending count.
    ///
    /// Equal tallies keep the tied-set order so reruns over the same votes
    /// produce the same winners.
    pub fn tally(&self) -> Vec<(Uuid, u32)> {
        let mut counts: Vec<(Uuid, u32)> = self
            .submission_ids
            .iter()
            .map(|id| {
                let count = self.votes.iter().filter(|v| v.submission_id == *id).count() as u32;
                (*id, count)
            })
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}
