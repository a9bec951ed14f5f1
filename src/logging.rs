//! Tracing initialization
//!
//! Embedding applications call [`init`] once at startup; the filter falls
//! back to the configured `RUST_LOG` value when the environment does not
//! provide one.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;

/// Initialize the global tracing subscriber
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
