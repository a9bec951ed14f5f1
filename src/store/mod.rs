//! Collaborator contracts
//!
//! The engine never talks to a concrete database: every read/write goes
//! through these traits. The crate ships [`memory::MemoryStore`] for wiring
//! and tests; persistent implementations live with the embedding platform.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    CompetitionRound, Evaluation, Judge, Leaderboard, LeaderboardKey, Level, Submission,
    SubmissionAssignment, SubmissionStatus, TieBreak,
};

pub use memory::MemoryStore;

/// Query filter over the submission store
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub year: Option<i32>,
    pub level: Option<Level>,
    pub region: Option<String>,
    pub council: Option<String>,
    pub area_of_focus: Option<String>,
    pub statuses: Option<Vec<SubmissionStatus>>,
    /// When false, disqualified submissions are filtered out
    pub include_disqualified: bool,
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        if self.year.is_some_and(|y| y != submission.year) {
            return false;
        }
        if self.level.is_some_and(|l| l != submission.level) {
            return false;
        }
        if let Some(region) = &self.region {
            if submission.region.as_deref() != Some(region.as_str()) {
                return false;
            }
        }
        if let Some(council) = &self.council {
            if submission.council.as_deref() != Some(council.as_str()) {
                return false;
            }
        }
        if let Some(area) = &self.area_of_focus {
            if submission.area_of_focus != *area {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&submission.status) {
                return false;
            }
        }
        if !self.include_disqualified && submission.disqualified {
            return false;
        }
        true
    }
}

/// Round persistence contract
#[async_trait]
pub trait RoundStore: Send + Sync {
    async fn create_round(&self, round: CompetitionRound) -> AppResult<CompetitionRound>;
    async fn find_round(&self, id: &Uuid) -> AppResult<Option<CompetitionRound>>;
    async fn update_round(&self, round: CompetitionRound) -> AppResult<CompetitionRound>;
    /// Active rounds, most recently created first
    async fn active_rounds(&self) -> AppResult<Vec<CompetitionRound>>;
    /// Ended rounds, most recently created first
    async fn ended_rounds(&self) -> AppResult<Vec<CompetitionRound>>;
}

/// Submission store contract (read/write by id, query by filter)
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create_submission(&self, submission: Submission) -> AppResult<Submission>;
    async fn find_submission(&self, id: &Uuid) -> AppResult<Option<Submission>>;
    async fn update_submission(&self, submission: Submission) -> AppResult<Submission>;
    /// Matching submissions ordered by submission time, then id
    async fn query_submissions(&self, filter: &SubmissionFilter) -> AppResult<Vec<Submission>>;
    /// Distinct location keys carrying submissions for (year, area, level)
    async fn location_keys(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
    ) -> AppResult<Vec<String>>;
}

/// User/judge directory contract
#[async_trait]
pub trait JudgeDirectory: Send + Sync {
    async fn create_judge(&self, judge: Judge) -> AppResult<Judge>;
    /// Active judges eligible for the scope, in stable directory order
    async fn active_judges(
        &self,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Vec<Judge>>;
}

/// Assignment persistence contract
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// At-most-once insert keyed by submission id; a second insert for the
    /// same submission fails with `DuplicateAssignment`.
    async fn create_assignment(
        &self,
        assignment: SubmissionAssignment,
    ) -> AppResult<SubmissionAssignment>;
    async fn find_assignment(&self, submission_id: &Uuid)
        -> AppResult<Option<SubmissionAssignment>>;
    async fn update_assignment(
        &self,
        assignment: SubmissionAssignment,
    ) -> AppResult<SubmissionAssignment>;
    /// All assignments within a judging scope
    async fn assignments_in_scope(
        &self,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Vec<SubmissionAssignment>>;
}

/// Evaluation persistence contract
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn find_evaluation(
        &self,
        submission_id: &Uuid,
        judge_id: &Uuid,
    ) -> AppResult<Option<Evaluation>>;
    /// Insert or replace the (submission, judge) evaluation
    async fn upsert_evaluation(&self, evaluation: Evaluation) -> AppResult<Evaluation>;
    /// Evaluations for a submission in first-write order
    async fn evaluations_for(&self, submission_id: &Uuid) -> AppResult<Vec<Evaluation>>;
}

/// Leaderboard persistence contract
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Insert or replace the leaderboard for its key
    async fn upsert_leaderboard(&self, leaderboard: Leaderboard) -> AppResult<Leaderboard>;
    async fn find_leaderboard(&self, key: &LeaderboardKey) -> AppResult<Option<Leaderboard>>;
    async fn leaderboards_for(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
    ) -> AppResult<Vec<Leaderboard>>;
}

/// Tie-break persistence contract
#[async_trait]
pub trait TieBreakStore: Send + Sync {
    async fn create_tie_break(&self, tie_break: TieBreak) -> AppResult<TieBreak>;
    async fn find_tie_break(&self, id: &Uuid) -> AppResult<Option<TieBreak>>;
    async fn update_tie_break(&self, tie_break: TieBreak) -> AppResult<TieBreak>;
    /// Open tie-break for a (year, area, level, location) if one exists
    async fn open_tie_break_for(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
    ) -> AppResult<Option<TieBreak>>;
}

/// Everything the services need, as one injectable object
pub trait Store:
    RoundStore
    + SubmissionStore
    + JudgeDirectory
    + AssignmentStore
    + EvaluationStore
    + LeaderboardStore
    + TieBreakStore
{
}

impl<T> Store for T where
    T: RoundStore
        + SubmissionStore
        + JudgeDirectory
        + AssignmentStore
        + EvaluationStore
        + LeaderboardStore
        + TieBreakStore
{
}
