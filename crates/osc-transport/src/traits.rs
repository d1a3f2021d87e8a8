use crate::{Result, SinkInfo};

/// A minimal fire-and-forget datagram sink.
pub trait DatagramSink {
    /// Open a sink towards a target such as "127.0.0.1:7777".
    fn open(target: &str) -> Result<Self>
    where
        Self: Sized;

    /// Describe the sink for logging.
    fn info(&self) -> SinkInfo;

    /// Send one datagram. Failures are reported but never retried.
    fn transmit(&mut self, datagram: &[u8]) -> Result<()>;
}
