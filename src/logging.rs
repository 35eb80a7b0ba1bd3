use anyhow::{anyhow, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Initialize logging on stderr so stdout carries only the status line.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level:
/// 0 = warn, 1 = debug, 2+ = trace.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "blockfix=debug",
        _ => "blockfix=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(verbosity > 1)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Logger initialization failed: {}", e))?;

    debug!("Initialized blockfix v{}", crate::version());
    Ok(())
}

