//! Utility functions

pub mod time;

pub use time::{format_duration, time_until_from};
