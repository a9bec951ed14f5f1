//! Leaderboard model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::{Level, SubmissionStatus};

/// One ranked row of a leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub submission_id: Uuid,
    pub rank: u32,
    pub average_score: f64,
    pub status: SubmissionStatus,
}

/// Unique key of a materialized leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardKey {
    pub year: i32,
    pub area_of_focus: String,
    pub level: Level,
    pub location_key: String,
}

impl LeaderboardKey {
    pub fn new(year: i32, area_of_focus: &str, level: Level, location_key: &str) -> Self {
        Self {
            year,
            area_of_focus: area_of_focus.to_string(),
            level,
            location_key: location_key.to_string(),
        }
    }
}

/// Materialized ranking for (year, area_of_focus, level, location_key).
///
/// Rebuilt whenever evaluations change; `is_finalized` freezes it from
/// further ranking changes once advancement has fully run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub id: Uuid,
    pub year: i32,
    pub area_of_focus: String,
    pub level: Level,
    pub location_key: String,
    pub entries: Vec<LeaderboardEntry>,
    pub quota: u32,
    pub total_submissions: u32,
    pub is_finalized: bool,
    pub generated_at: DateTime<Utc>,
}

impl Leaderboard {
    /// Key this leaderboard is unique on
    pub fn key(&self) -> LeaderboardKey {
        LeaderboardKey::new(self.year, &self.area_of_focus, self.level, &self.location_key)
    }

    /// Look up an entry by submission id
    pub fn entry(&self, submission_id: &Uuid) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.submission_id == *submission_id)
    }
}

/// Assign standard competition ranks over entries already sorted by
/// descending score: ties share a rank and the next distinct score
/// continues at `previous_rank + tie_group_size`.
pub fn assign_competition_ranks(entries: &mut [LeaderboardEntry]) {
    let mut current_rank = 1u32;
    for idx in 0..entries.len() {
        if idx > 0 && entries[idx].average_score != entries[idx - 1].average_score {
            current_rank = idx as u32 + 1;
        }
        entries[idx].rank = current_rank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            submission_id: Uuid::new_v4(),
            rank: 0,
            average_score: score,
            status: SubmissionStatus::Evaluated,
        }
    }

    #[test]
    fn test_competition_ranking_with_ties() {
        let mut entries = vec![entry(90.0), entry(85.0), entry(85.0), entry(80.0)];
        assign_competition_ranks(&mut entries);
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_ranking_all_tied() {
        let mut entries = vec![entry(70.0), entry(70.0), entry(70.0)];
        assign_competition_ranks(&mut entries);
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 1, 1]);
    }

    #[test]
    fn test_ranking_distinct_scores() {
        let mut entries = vec![entry(95.0), entry(90.0), entry(85.0)];
        assign_competition_ranks(&mut entries);
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }
}
