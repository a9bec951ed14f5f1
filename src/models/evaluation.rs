//! Evaluation model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::constants::{
    MAX_COMMENT_LENGTH, MAX_CRITERIA_PER_EVALUATION, MAX_CRITERION_SCORE, MIN_CRITERION_SCORE,
};

/// One judge's scored criteria for one submission.
///
/// Uniquely keyed by (submission_id, judge_id): a judge may revise their own
/// evaluation but never create a second one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub scores: BTreeMap<String, f64>,
    pub comments: Option<String>,
    pub total_score: f64,
    pub average_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evaluation {
    /// Sum of all criterion scores
    pub fn compute_total(scores: &BTreeMap<String, f64>) -> f64 {
        scores.values().sum()
    }

    /// Mean criterion score, 0 when no criteria were scored
    pub fn compute_average(scores: &BTreeMap<String, f64>) -> f64 {
        if scores.is_empty() {
            0.0
        } else {
            Self::compute_total(scores) / scores.len() as f64
        }
    }
}

/// Incoming evaluation payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EvaluationInput {
    #[validate(custom(function = validate_scores))]
    pub scores: BTreeMap<String, f64>,
    #[validate(length(max = MAX_COMMENT_LENGTH))]
    pub comments: Option<String>,
}

/// Criterion scores must be non-empty, bounded, and finite
fn validate_scores(scores: &BTreeMap<String, f64>) -> Result<(), ValidationError> {
    if scores.is_empty() {
        return Err(ValidationError::new("scores_empty"));
    }
    if scores.len() > MAX_CRITERIA_PER_EVALUATION {
        return Err(ValidationError::new("too_many_criteria"));
    }
    for (criterion, value) in scores {
        if criterion.trim().is_empty() {
            return Err(ValidationError::new("blank_criterion"));
        }
        if !value.is_finite() || *value < MIN_CRITERION_SCORE || *value > MAX_CRITERION_SCORE {
            return Err(ValidationError::new("score_out_of_range"));
        }
    }
    Ok(())
}
