//! Application-wide constants
//!
//! This module contains all constant values used throughout the engine.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// ENGINE DEFAULTS
// =============================================================================

/// Default number of slots a location may promote to the next tier
pub const DEFAULT_PROMOTION_QUOTA: u32 = 3;

/// Default lead time before a round's effective end at which the
/// `round_ending_soon` notification fires (minutes)
pub const DEFAULT_ENDING_SOON_LEAD_MINUTES: i64 = 60;

/// Default countdown duration for countdown-timed rounds (minutes)
pub const DEFAULT_COUNTDOWN_MINUTES: i64 = 7 * 24 * 60;

/// Decimal places kept when averaging National-tier evaluations
pub const SCORE_DECIMAL_PLACES: u32 = 2;

// =============================================================================
// REALTIME DEFAULTS
// =============================================================================

/// Default capacity of the in-process broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

// =============================================================================
// COMPETITION LEVELS
// =============================================================================

/// Competition level identifiers
pub mod levels {
    pub const COUNCIL: &str = "council";
    pub const REGIONAL: &str = "regional";
    pub const NATIONAL: &str = "national";

    /// All competition levels
    pub const ALL: &[&str] = &[COUNCIL, REGIONAL, NATIONAL];
}

/// Sentinel location key for submissions that are not scoped to a
/// (region, council) pair
pub const NATIONWIDE_LOCATION_KEY: &str = "nationwide";

// =============================================================================
// ROUND MATCHING PRIORITIES
// =============================================================================

/// Priorities used when picking the best active round for a submission
/// without an explicit round id. Highest wins; ties keep the most
/// recently created round.
pub mod match_priority {
    /// Exact level + region + council match
    pub const EXACT_LOCATION: u8 = 100;
    /// Region-scoped round matching a Council submission's region
    pub const COUNCIL_REGION_ONLY: u8 = 80;
    /// Exact region match for a Regional submission
    pub const REGIONAL_EXACT_REGION: u8 = 100;
    /// Nationwide round for a National submission
    pub const NATIONAL_NATIONWIDE: u8 = 100;
    /// Region-scoped National round as fallback for a National submission
    pub const NATIONAL_FALLBACK: u8 = 90;
    /// Nationwide round as fallback for a Regional submission
    pub const REGIONAL_FALLBACK: u8 = 50;
    /// Nationwide round as fallback for a Council submission
    pub const COUNCIL_FALLBACK: u8 = 30;
}

// =============================================================================
// ROUND STATUSES
// =============================================================================

/// Competition round lifecycle statuses
pub mod round_statuses {
    pub const PENDING: &str = "pending";
    pub const ACTIVE: &str = "active";
    pub const ENDED: &str = "ended";
    pub const CLOSED: &str = "closed";
}

// =============================================================================
// SUBMISSION STATUSES
// =============================================================================

/// Submission lifecycle statuses
pub mod submission_statuses {
    pub const PENDING: &str = "pending";
    pub const EVALUATED: &str = "evaluated";
    pub const PROMOTED: &str = "promoted";
    pub const ELIMINATED: &str = "eliminated";
}

// =============================================================================
// JUDGE DIRECTORY
// =============================================================================

/// User role identifiers consumed from the judge directory
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const JUDGE: &str = "judge";
    pub const TEACHER: &str = "teacher";
}

// =============================================================================
// NOTIFICATION EVENTS
// =============================================================================

/// Notification event type identifiers
pub mod notification_events {
    pub const JUDGE_ASSIGNED: &str = "judge_assigned";
    pub const ROUND_STARTED: &str = "round_started";
    pub const ROUND_ENDING_SOON: &str = "round_ending_soon";
    pub const ROUND_ENDED: &str = "round_ended";
    pub const SUBMISSION_PROMOTED: &str = "submission_promoted";
    pub const SUBMISSION_ELIMINATED: &str = "submission_eliminated";
}

/// Real-time broadcast event type identifiers
pub mod realtime_events {
    pub const SCORE_UPDATED: &str = "score-updated";
    pub const ROUND_STATE_CHANGED: &str = "round-state-changed";
    pub const LEADERBOARD_MODE_CHANGED: &str = "leaderboard-mode-changed";
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Minimum value of a single criterion score
pub const MIN_CRITERION_SCORE: f64 = 0.0;

/// Maximum value of a single criterion score
pub const MAX_CRITERION_SCORE: f64 = 100.0;

/// Maximum number of scored criteria per evaluation
pub const MAX_CRITERIA_PER_EVALUATION: usize = 32;

/// Maximum evaluation comment length
pub const MAX_COMMENT_LENGTH: u64 = 4096;
