//! Domain models
//!
//! This module contains all domain models used throughout the engine.

pub mod assignment;
pub mod evaluation;
pub mod event;
pub mod judge;
pub mod leaderboard;
pub mod round;
pub mod submission;
pub mod tiebreak;

pub use assignment::*;
pub use evaluation::*;
pub use event::*;
pub use judge::*;
pub use leaderboard::*;
pub use round::*;
pub use submission::*;
pub use tiebreak::*;
