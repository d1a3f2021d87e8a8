//! osc-transport: datagram sinks for OSC telemetry
//!
//! This crate provides the byte-sink seam the telemetry encoder writes into. Every
//! datagram is sent at most once; there is no retry or acknowledgement. The default
//! build enables a `mock` backend that records datagrams in memory so that flows are
//! testable without a network.

mod types;
pub use types::{SentDatagram, SinkInfo, Timestamp};

mod error;
pub use error::{Result, TransportError};

mod traits;
pub use traits::DatagramSink;

mod udp;
pub use udp::UdpSink;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::MockSink;
