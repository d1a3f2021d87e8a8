use osc_transport::TransportError;
use thiserror::Error;

/// Failure to deliver one message. Logged and counted, never surfaced to the SDK.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("OSC encode error: {0}")]
    Encode(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("device request rejected: {0}")]
    Rejected(String),
}
