//! In-memory store
//!
//! A single `RwLock` guards all entity maps so multi-entity writes observe a
//! consistent view. Judges keep directory insertion order (the allocator's
//! tie-break depends on query order) and evaluations keep first-write order
//! (the one-to-one duplicate fallback takes the first).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CompetitionRound, Evaluation, Judge, Leaderboard, LeaderboardKey, Level, RoundStatus,
    Submission, SubmissionAssignment, TieBreak, TieBreakStatus,
};
use crate::store::{
    AssignmentStore, EvaluationStore, JudgeDirectory, LeaderboardStore, RoundStore,
    SubmissionFilter, SubmissionStore, TieBreakStore,
};

#[derive(Default)]
struct Inner {
    rounds: HashMap<Uuid, CompetitionRound>,
    submissions: HashMap<Uuid, Submission>,
    judges: Vec<Judge>,
    /// Keyed by submission id: the at-most-once constraint
    assignments: HashMap<Uuid, SubmissionAssignment>,
    /// Keyed by submission id, first-write order preserved
    evaluations: HashMap<Uuid, Vec<Evaluation>>,
    leaderboards: HashMap<LeaderboardKey, Leaderboard>,
    tie_breaks: HashMap<Uuid, TieBreak>,
}

/// In-memory implementation of every store contract
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoundStore for MemoryStore {
    async fn create_round(&self, round: CompetitionRound) -> AppResult<CompetitionRound> {
        let mut inner = self.inner.write().await;
        inner.rounds.insert(round.id, round.clone());
        Ok(round)
    }

    async fn find_round(&self, id: &Uuid) -> AppResult<Option<CompetitionRound>> {
        let inner = self.inner.read().await;
        Ok(inner.rounds.get(id).cloned())
    }

    async fn update_round(&self, round: CompetitionRound) -> AppResult<CompetitionRound> {
        let mut inner = self.inner.write().await;
        if !inner.rounds.contains_key(&round.id) {
            return Err(AppError::NotFound(format!("round {} not found", round.id)));
        }
        inner.rounds.insert(round.id, round.clone());
        Ok(round)
    }

    async fn active_rounds(&self) -> AppResult<Vec<CompetitionRound>> {
        let inner = self.inner.read().await;
        let mut rounds: Vec<CompetitionRound> = inner
            .rounds
            .values()
            .filter(|r| r.status == RoundStatus::Active)
            .cloned()
            .collect();
        rounds.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rounds)
    }

    async fn ended_rounds(&self) -> AppResult<Vec<CompetitionRound>> {
        let inner = self.inner.read().await;
        let mut rounds: Vec<CompetitionRound> = inner
            .rounds
            .values()
            .filter(|r| r.status == RoundStatus::Ended)
            .cloned()
            .collect();
        rounds.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rounds)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create_submission(&self, submission: Submission) -> AppResult<Submission> {
        let mut inner = self.inner.write().await;
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: &Uuid) -> AppResult<Option<Submission>> {
        let inner = self.inner.read().await;
        Ok(inner.submissions.get(id).cloned())
    }

    async fn update_submission(&self, submission: Submission) -> AppResult<Submission> {
        let mut inner = self.inner.write().await;
        if !inner.submissions.contains_key(&submission.id) {
            return Err(AppError::NotFound(format!(
                "submission {} not found",
                submission.id
            )));
        }
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn query_submissions(&self, filter: &SubmissionFilter) -> AppResult<Vec<Submission>> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn location_keys(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
    ) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        let mut keys: Vec<String> = inner
            .submissions
            .values()
            .filter(|s| s.year == year && s.level == level && s.area_of_focus == area_of_focus)
            .map(|s| s.location_key().encode())
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[async_trait]
impl JudgeDirectory for MemoryStore {
    async fn create_judge(&self, judge: Judge) -> AppResult<Judge> {
        let mut inner = self.inner.write().await;
        inner.judges.push(judge.clone());
        Ok(judge)
    }

    async fn active_judges(
        &self,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Vec<Judge>> {
        let inner = self.inner.read().await;
        Ok(inner
            .judges
            .iter()
            .filter(|j| j.is_eligible_for(level, region, council))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn create_assignment(
        &self,
        assignment: SubmissionAssignment,
    ) -> AppResult<SubmissionAssignment> {
        let mut inner = self.inner.write().await;
        if inner.assignments.contains_key(&assignment.submission_id) {
            return Err(AppError::DuplicateAssignment(assignment.submission_id));
        }
        inner
            .assignments
            .insert(assignment.submission_id, assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(
        &self,
        submission_id: &Uuid,
    ) -> AppResult<Option<SubmissionAssignment>> {
        let inner = self.inner.read().await;
        Ok(inner.assignments.get(submission_id).cloned())
    }

    async fn update_assignment(
        &self,
        assignment: SubmissionAssignment,
    ) -> AppResult<SubmissionAssignment> {
        let mut inner = self.inner.write().await;
        if !inner.assignments.contains_key(&assignment.submission_id) {
            return Err(AppError::NotFound(format!(
                "assignment for submission {} not found",
                assignment.submission_id
            )));
        }
        inner
            .assignments
            .insert(assignment.submission_id, assignment.clone());
        Ok(assignment)
    }

    async fn assignments_in_scope(
        &self,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> AppResult<Vec<SubmissionAssignment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .assignments
            .values()
            .filter(|a| {
                a.level == level
                    && (region.is_none() || a.region.as_deref() == region)
                    && (council.is_none() || a.council.as_deref() == council)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn find_evaluation(
        &self,
        submission_id: &Uuid,
        judge_id: &Uuid,
    ) -> AppResult<Option<Evaluation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .evaluations
            .get(submission_id)
            .and_then(|evals| evals.iter().find(|e| e.judge_id == *judge_id))
            .cloned())
    }

    async fn upsert_evaluation(&self, evaluation: Evaluation) -> AppResult<Evaluation> {
        let mut inner = self.inner.write().await;
        let evals = inner
            .evaluations
            .entry(evaluation.submission_id)
            .or_default();
        match evals.iter_mut().find(|e| e.judge_id == evaluation.judge_id) {
            Some(existing) => *existing = evaluation.clone(),
            None => evals.push(evaluation.clone()),
        }
        Ok(evaluation)
    }

    async fn evaluations_for(&self, submission_id: &Uuid) -> AppResult<Vec<Evaluation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .evaluations
            .get(submission_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn upsert_leaderboard(&self, leaderboard: Leaderboard) -> AppResult<Leaderboard> {
        let mut inner = self.inner.write().await;
        inner
            .leaderboards
            .insert(leaderboard.key(), leaderboard.clone());
        Ok(leaderboard)
    }

    async fn find_leaderboard(&self, key: &LeaderboardKey) -> AppResult<Option<Leaderboard>> {
        let inner = self.inner.read().await;
        Ok(inner.leaderboards.get(key).cloned())
    }

    async fn leaderboards_for(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
    ) -> AppResult<Vec<Leaderboard>> {
        let inner = self.inner.read().await;
        let mut boards: Vec<Leaderboard> = inner
            .leaderboards
            .values()
            .filter(|b| b.year == year && b.area_of_focus == area_of_focus && b.level == level)
            .cloned()
            .collect();
        boards.sort_by(|a, b| a.location_key.cmp(&b.location_key));
        Ok(boards)
    }
}

#[async_trait]
impl TieBreakStore for MemoryStore {
    async fn create_tie_break(&self, tie_break: TieBreak) -> AppResult<TieBreak> {
        let mut inner = self.inner.write().await;
        inner.tie_breaks.insert(tie_break.id, tie_break.clone());
        Ok(tie_break)
    }

    async fn find_tie_break(&self, id: &Uuid) -> AppResult<Option<TieBreak>> {
        let inner = self.inner.read().await;
        Ok(inner.tie_breaks.get(id).cloned())
    }

    async fn update_tie_break(&self, tie_break: TieBreak) -> AppResult<TieBreak> {
        let mut inner = self.inner.write().await;
        if !inner.tie_breaks.contains_key(&tie_break.id) {
            return Err(AppError::NotFound(format!(
                "tie-break {} not found",
                tie_break.id
            )));
        }
        inner.tie_breaks.insert(tie_break.id, tie_break.clone());
        Ok(tie_break)
    }

    async fn open_tie_break_for(
        &self,
        year: i32,
        area_of_focus: &str,
        level: Level,
        location_key: &str,
    ) -> AppResult<Option<TieBreak>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tie_breaks
            .values()
            .find(|t| {
                t.status == TieBreakStatus::Open
                    && t.year == year
                    && t.area_of_focus == area_of_focus
                    && t.level == level
                    && t.location_key == location_key
            })
            .cloned())
    }
}
