//! Structured logging initialization
//!
//! Everything the bootstrap prints goes through tracing, so container logs
//! stay line-oriented and greppable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Initialize structured logging for a component.
///
/// Defaults to `INFO`; `RUST_LOG` overrides. Returns a guard that should be
/// held for the lifetime of the program.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("mongo-init");
/// info!("Starting mongo-init");
/// ```
pub fn init_logging(component: &str) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let format = fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();

    tracing::debug!(component, "Logging initialized");

    LogGuard
}
