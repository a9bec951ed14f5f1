//! Business logic services
//!
//! Stateless service structs operating on the store and event
//! collaborators. Each service owns one slice of the competition
//! lifecycle, from round timing through assignment, scoring,
//! leaderboards and quota advancement.

pub mod advancement_service;
pub mod assignment_service;
pub mod leaderboard_service;
pub mod round_service;
pub mod scoring_service;
pub mod tiebreak_service;
pub mod tier_policy;

pub use advancement_service::{AdvancementService, GlobalAdvancement, LocationAdvancement};
pub use assignment_service::AssignmentService;
pub use leaderboard_service::LeaderboardService;
pub use round_service::{CreateRoundRequest, RoundService, SweepReport};
pub use scoring_service::ScoringService;
pub use tiebreak_service::TieBreakService;
pub use tier_policy::{policy_for, OneToManyPolicy, OneToOnePolicy, TierPolicy};
