//! Observability utilities.
//!
//! Tracing setup for the engine. Initialization is process-wide and
//! idempotent so library consumers and tests can call it freely.

use crate::types::ObservabilityConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing from the environment.
///
/// `RUST_LOG` drives the filter (default `info`);
/// `STEWARD_LOG_FORMAT=json` switches to JSON output.
pub fn init_tracing() {
    let json = std::env::var("STEWARD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    init_with(filter, json);
}

/// Initialize tracing from an [`ObservabilityConfig`]. `RUST_LOG` still wins
/// over the configured level when set.
pub fn init_tracing_with(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    init_with(filter, config.json_logs);
}

fn init_with(filter: EnvFilter, json: bool) {
    TRACING_INIT.get_or_init(|| {
        let result = if json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}
