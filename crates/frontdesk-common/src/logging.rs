use tracing_subscriber::EnvFilter;

const FALLBACK_LEVEL: &str = "info";

/// Installs the global fmt subscriber on stderr, leaving stdout to CLI output.
/// `RUST_LOG` takes precedence over `log_level`; a second call is a no-op.
pub fn init(log_level: &str) {
    let filter = resolve_filter(log_level);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}
