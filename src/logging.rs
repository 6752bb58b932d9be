use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber for the binary.
///
/// `RUST_LOG` wins when it is set. Otherwise the crate logs at `info`, or `debug` with
/// `verbose`, and dependencies stay at `warn`.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,detection_pipeline={}", default_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
