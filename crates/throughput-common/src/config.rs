use crate::error::ThroughputError;
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at the config file.
pub const CONFIG_ENV: &str = "THROUGHPUT_CONFIG";
/// Config file looked up in the working directory when `CONFIG_ENV` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "throughput.json";

/// What the sending callback does with outbound chunk and batch packets.
///
/// Only one mode can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    /// Forward every packet untouched.
    #[default]
    PassThrough,
    /// Cancel delivery, isolating client processing cost from network cost.
    Suppress,
    /// Replace chunk payloads with the precomputed empty chunk.
    Substitute,
    /// Cancel the packet and resend it unfiltered on the next server tick.
    Reschedule,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::PassThrough => write!(f, "pass_through"),
            SendMode::Suppress => write!(f, "suppress"),
            SendMode::Substitute => write!(f, "substitute"),
            SendMode::Reschedule => write!(f, "reschedule"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentationConfig {
    pub send_mode: SendMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub bind_address: String,
    pub protocol_version: i32,
    /// Radius, in chunks, of the square streamed to each client.
    pub view_distance: u8,
    /// Server ticks per second.
    pub tick_rate: u32,
    pub max_unacknowledged_batches: u32,
    /// Batch size used until the client reports its own rate.
    pub initial_chunks_per_tick: f32,
    /// Worker tasks draining the async listener queue.
    pub async_workers: usize,
    pub instrumentation: InstrumentationConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:25565".to_owned(),
            protocol_version: 765,
            view_distance: 8,
            tick_rate: 20,
            max_unacknowledged_batches: 1,
            initial_chunks_per_tick: 9.0,
            async_workers: 2,
            instrumentation: InstrumentationConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Loads the config from `$THROUGHPUT_CONFIG`, then `./throughput.json`,
    /// falling back to the defaults when neither exists.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| ThroughputError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let config = Self::from_json(&contents).map_err(|err| match err {
            ThroughputError::Config { reason, .. } => ThroughputError::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        info!(path = %path.display(), send_mode = %config.instrumentation.send_mode, "Loaded config");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| ThroughputError::Config {
            path: PathBuf::from("<inline>"),
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| ThroughputError::Config {
            path: PathBuf::from("<inline>"),
            reason: reason.to_owned(),
        };

        if self.tick_rate == 0 {
            return Err(invalid("tick_rate must be positive"));
        }
        if self.async_workers == 0 {
            return Err(invalid("async_workers must be positive"));
        }
        if self.max_unacknowledged_batches == 0 {
            return Err(invalid("max_unacknowledged_batches must be positive"));
        }
        if !(self.initial_chunks_per_tick.is_finite() && self.initial_chunks_per_tick > 0.0) {
            return Err(invalid("initial_chunks_per_tick must be a positive number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults_are_pass_through() {
        let config = HarnessConfig::default();
        assert_eq!(config.instrumentation.send_mode, SendMode::PassThrough);
        assert_eq!(config.bind_address, "0.0.0.0:25565");
        assert_eq!(config.tick_rate, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = HarnessConfig::from_json(
            r#"{ "view_distance": 2, "instrumentation": { "send_mode": "substitute" } }"#,
        )
        .unwrap();
        assert_eq!(config.view_distance, 2);
        assert_eq!(config.instrumentation.send_mode, SendMode::Substitute);
        assert_eq!(config.async_workers, 2);
    }

    #[test]
    fn test_unknown_send_mode_is_rejected() {
        let result = HarnessConfig::from_json(r#"{ "instrumentation": { "send_mode": "drop" } }"#);
        assert_matches!(result, Err(ThroughputError::Config { .. }));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let result = HarnessConfig::from_json(r#"{ "async_workers": 0 }"#);
        assert_matches!(result, Err(ThroughputError::Config { reason, .. }) if reason.contains("async_workers"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let result = HarnessConfig::from_file("/nonexistent/throughput.json");
        assert_matches!(
            result,
            Err(ThroughputError::Config { path, .. }) if path == Path::new("/nonexistent/throughput.json")
        );
    }

    #[test]
    fn test_send_mode_display_matches_serde_name() {
        for mode in [
            SendMode::PassThrough,
            SendMode::Suppress,
            SendMode::Substitute,
            SendMode::Reschedule,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }
    }
}
