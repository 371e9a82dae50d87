// Logging module - Logging infrastructure
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool, level: &str) -> String {
    let level = if verbose { "debug" } else { level };
    format!("serialsh={}", level)
}

/// Initialize logging system.
///
/// `RUST_LOG` wins over `verbose` and the configured level. Diagnostics go
/// to stderr so captured command output on stdout stays clean.
pub fn init_logging(verbose: bool, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(verbose)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .try_init()?;

    tracing::debug!("serialsh logging system initialized");
    Ok(())
}
