use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zeorun_core::ZEORUN_LOG_VAR;

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, trace, warn, Level};

/// Initialize the tracing system
///
/// The filter comes from `ZEORUN_LOG`, then `RUST_LOG`, then the verbosity
/// count (0 = info, 1 = debug, 2+ = trace). Events go to stderr so that
/// stdout stays clean for JSON output.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = env_filter(verbosity);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(ZEORUN_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}
