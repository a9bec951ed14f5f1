//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::NATIONWIDE_LOCATION_KEY;

/// Competition level (tier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Council,
    Regional,
    National,
}

impl Level {
    /// Get level as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Council => "council",
            Self::Regional => "regional",
            Self::National => "national",
        }
    }

    /// Parse level from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "council" => Some(Self::Council),
            "regional" => Some(Self::Regional),
            "national" => Some(Self::National),
            _ => None,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic identifier for a (region, council) pair, or the
/// nationwide sentinel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub region: Option<String>,
    pub council: Option<String>,
}

impl LocationKey {
    /// Key for submissions not scoped to any region
    pub fn nationwide() -> Self {
        Self {
            region: None,
            council: None,
        }
    }

    /// Key scoped to a region only
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            council: None,
        }
    }

    /// Key scoped to a (region, council) pair
    pub fn council(region: impl Into<String>, council: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            council: Some(council.into()),
        }
    }

    /// Derive the location key a submission is ranked under, per level:
    /// Council ranks per (region, council), Regional per region, National
    /// nationwide.
    pub fn for_submission(submission: &Submission) -> Self {
        match submission.level {
            Level::Council => Self {
                region: submission.region.clone(),
                council: submission.council.clone(),
            },
            Level::Regional => Self {
                region: submission.region.clone(),
                council: None,
            },
            Level::National => Self::nationwide(),
        }
    }

    /// Decode an encoded key back into its parts; the level determines the
    /// expected shape.
    pub fn decode(level: Level, encoded: &str) -> Self {
        if encoded == NATIONWIDE_LOCATION_KEY || level == Level::National {
            return Self::nationwide();
        }
        match encoded.split_once('/') {
            Some((region, council)) => Self::council(region, council),
            None => Self::region(encoded),
        }
    }

    /// Encode as a stable string key
    pub fn encode(&self) -> String {
        match (&self.region, &self.council) {
            (Some(region), Some(council)) => format!("{}/{}", region, council),
            (Some(region), None) => region.clone(),
            _ => NATIONWIDE_LOCATION_KEY.to_string(),
        }
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Submission lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Evaluated,
    Promoted,
    Eliminated,
}

impl SubmissionStatus {
    /// Get status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Evaluated => "evaluated",
            Self::Promoted => "promoted",
            Self::Eliminated => "eliminated",
        }
    }

    /// Promoted and eliminated are terminal; the aggregator must not
    /// overwrite them back to evaluated.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Promoted | Self::Eliminated)
    }
}

/// Submission entity (owned by the surrounding platform; the engine
/// mutates `average_score` and `status` only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub year: i32,
    pub level: Level,
    pub region: Option<String>,
    pub council: Option<String>,
    pub area_of_focus: String,
    pub round_id: Option<Uuid>,
    pub average_score: Option<f64>,
    pub status: SubmissionStatus,
    pub disqualified: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// The location key this submission is ranked under
    pub fn location_key(&self) -> LocationKey {
        LocationKey::for_submission(self)
    }
}
