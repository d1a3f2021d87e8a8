use time::OffsetDateTime;

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }
}

/// A datagram captured by a recording sink.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SentDatagram {
    pub bytes: Vec<u8>,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug)]
pub struct SinkInfo {
    pub target: String,
    pub driver: String,
}
