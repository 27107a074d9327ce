use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThroughputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{packet} has no {kind} field at index {index}")]
    FieldNotFound {
        packet: &'static str,
        kind: &'static str,
        index: usize,
    },

    #[error("Unsupported packet id 0x{0:02x}")]
    UnsupportedPacket(i32),

    #[error("Failed to switch packet listener to {target}: {reason}")]
    TransitionFailed { target: &'static str, reason: String },

    #[error("Async listener error: {0}")]
    AsyncHandler(String),

    #[error("Packet listener is not installed")]
    Disabled,

    #[error("Invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl ThroughputError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        ThroughputError::Protocol(msg.into())
    }

    pub fn field_not_found(packet: &'static str, kind: &'static str, index: usize) -> Self {
        ThroughputError::FieldNotFound {
            packet,
            kind,
            index,
        }
    }

    /// Whether the error only concerns a single packet event and can be skipped.
    pub fn is_event_local(&self) -> bool {
        matches!(
            self,
            ThroughputError::FieldNotFound { .. }
                | ThroughputError::UnsupportedPacket(_)
                | ThroughputError::Protocol(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: ThroughputError = io_err.into();
        assert_matches!(err, ThroughputError::Io(_));
        assert_eq!(err.to_string(), "IO error: short read");
    }

    #[test]
    fn test_field_not_found_display() {
        let err = ThroughputError::field_not_found("ChunkBatchStart", "float", 0);
        assert_eq!(err.to_string(), "ChunkBatchStart has no float field at index 0");
        assert!(err.is_event_local());
    }

    #[test]
    fn test_transition_failure_is_not_event_local() {
        let err = ThroughputError::TransitionFailed {
            target: "async",
            reason: "no runtime".to_owned(),
        };
        assert!(!err.is_event_local());
        assert_eq!(
            err.to_string(),
            "Failed to switch packet listener to async: no runtime"
        );
    }
}
