//! Structured logging setup.
//!
//! JSON format for production environments, pretty format for development.
//! The level is taken from `RUST_LOG` when set, falling back to the
//! configured global level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; later calls return an error from the
/// subscriber registry, which callers may ignore in tests.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    }

    Ok(())
}
