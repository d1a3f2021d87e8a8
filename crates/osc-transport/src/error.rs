use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not resolve target: {0}")]
    UnresolvedTarget(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("datagram too large: {0} bytes")]
    Oversized(usize),
    #[error("injected failure: {0}")]
    Injected(&'static str),
}
