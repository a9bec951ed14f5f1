//! Judge directory entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::submission::Level;

/// View of a user from the judge directory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judge {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub assigned_level: Level,
    pub assigned_region: Option<String>,
    pub assigned_council: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Judge {
    /// Check whether this judge may be allocated work for the given scope
    pub fn is_eligible_for(
        &self,
        level: Level,
        region: Option<&str>,
        council: Option<&str>,
    ) -> bool {
        if !self.is_active || self.role != crate::constants::roles::JUDGE {
            return false;
        }
        if self.assigned_level != level {
            return false;
        }
        match level {
            Level::Council => {
                self.assigned_region.as_deref() == region
                    && self.assigned_council.as_deref() == council
            }
            Level::Regional => self.assigned_region.as_deref() == region,
            Level::National => true,
        }
    }
}
