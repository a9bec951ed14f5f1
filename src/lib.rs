//! TierComp - Competition Lifecycle & Advancement Engine
//!
//! This library powers a multi-tier teaching-skills competition in which
//! submissions progress through council, regional and national rounds.
//!
//! # Features
//!
//! - Round lifecycle with fixed-time and countdown windows
//! - Priority-based matching of submissions to active rounds
//! - Round-robin judge assignment at the one-to-one tiers
//! - Tier-specific canonical scoring (sole judge vs averaged panel)
//! - Live and frozen leaderboards with standard competition ranking
//! - Quota advancement with boundary-tie suspension and tie-break votes
//!
//! # Architecture
//!
//! The engine is a library with injected collaborators:
//! - **Services**: Business logic
//! - **Store**: Persistence contracts plus an in-memory implementation
//! - **Events**: Notification and realtime broadcast seams
//! - **Models**: Domain models and DTOs

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
