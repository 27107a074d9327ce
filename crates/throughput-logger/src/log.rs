use crate::severity::LogSeverity;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. The filter comes from `RUST_LOG` and
/// defaults to `info`. Returns false when a subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

pub fn log(msg: String, log_severity: LogSeverity) {
    match log_severity {
        LogSeverity::Debug => tracing::debug!("{}", msg),
        LogSeverity::Info => tracing::info!("{}", msg),
        LogSeverity::Warning => tracing::warn!("{}", msg),
        LogSeverity::Error => tracing::error!("{}", msg),
        LogSeverity::Fatal => tracing::error!(fatal = true, "{}", msg),
    }
}
