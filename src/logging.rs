use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stdout `tracing` subscriber filtered by `log_level`
/// (an `EnvFilter` directive such as `"recall_bayes=debug"`).
///
/// Invalid directives fall back to `info`. Returns `false` if a global
/// subscriber was already installed, so tests and binaries may call this
/// more than once.
pub fn init_tracing(log_level: &str) -> bool {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

/// [`init_tracing`] with the level from `RUST_LOG`, defaulting to `info`
pub fn init_tracing_from_env() -> bool {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    init_tracing(&log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("recall_bayes=debug");
        assert!(!init_tracing("not a valid [directive"));
    }
}
