//! Structured logging setup.
//!
//! All output goes to stderr so CLI stdout stays machine-parseable. The
//! `RUST_LOG` environment variable, when set, overrides the configured level.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let layer = match config.format.as_str() {
            "json" => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .with_filter(filter_for(&config.level))
                .boxed(),
            _ => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter_for(&config.level))
                .boxed(),
        };

        // Tests and embedding hosts may have installed one already.
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("global tracing subscriber already set");
        }
    });
}
