use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "procrastinate=info";

/// Initialize tracing for processes that do not install their own subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` (or [`DEFAULT_LOG_FILTER`]).
/// Fails instead of panicking when a global subscriber is already set, since
/// hosts usually own logging.
pub fn init_telemetry(default_filter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let fallback = default_filter.unwrap_or(DEFAULT_LOG_FILTER).to_string();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::debug!("Tracing initialized for procrastinate host integration");
    Ok(())
}
