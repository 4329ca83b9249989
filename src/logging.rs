//! Tracing setup and timing helpers.

use std::time::Instant;

use tracing_subscriber::EnvFilter;

use crate::config::env;

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, falling back to
/// `LOGGING_LEVEL`. Output is JSON except in development mode, where
/// human-readable logs are kept.
pub fn init() {
    let level = env::get_or("LOGGING_LEVEL", "info").to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if env::is_development_mode() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

/// Logs elapsed wall time for a labeled phase when dropped.
pub struct ExecutionTimer {
    label: &'static str,
    started: Instant,
}

impl ExecutionTimer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }
}

impl Drop for ExecutionTimer {
    fn drop(&mut self) {
        tracing::info!(
            "{}: {:.5}s",
            self.label,
            self.started.elapsed().as_secs_f64()
        );
    }
}
