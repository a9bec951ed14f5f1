//! Submission assignment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::Level;

/// 1:1 submission-to-judge mapping for Council/Regional tiers.
///
/// Unique per submission; created once and never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAssignment {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub judge_id: Uuid,
    pub level: Level,
    pub region: Option<String>,
    pub council: Option<String>,
    pub judge_notified: bool,
    pub assigned_at: DateTime<Utc>,
}
