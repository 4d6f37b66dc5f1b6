//! Observability infrastructure: structured logging via `tracing`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (e.g. "info",
/// "dcm_core=debug") is used as the filter.
///
/// Must be called once at application startup.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_level(true))
        .try_init()?;

    tracing::debug!("Observability initialized");
    Ok(())
}
