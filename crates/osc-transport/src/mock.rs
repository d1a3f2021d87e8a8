use crate::{DatagramSink, Result, SentDatagram, SinkInfo, Timestamp, TransportError};

/// A simple in-process recording sink. Each sink instance is independent.
#[derive(Debug, Default)]
pub struct MockSink {
    target: String,
    sent: Vec<SentDatagram>,
    failing: bool,
}

impl MockSink {
    /// A sink that rejects every datagram, for exercising fire-and-forget paths.
    pub fn failing(target: &str) -> Self {
        Self {
            target: target.to_string(),
            sent: Vec::new(),
            failing: true,
        }
    }

    pub fn sent(&self) -> &[SentDatagram] {
        &self.sent
    }

    /// Drain the recorded datagrams.
    pub fn take(&mut self) -> Vec<SentDatagram> {
        std::mem::take(&mut self.sent)
    }
}

impl DatagramSink for MockSink {
    fn open(target: &str) -> Result<Self> {
        Ok(Self {
            target: target.to_string(),
            ..Self::default()
        })
    }

    fn info(&self) -> SinkInfo {
        SinkInfo {
            target: self.target.clone(),
            driver: "mock".to_string(),
        }
    }

    fn transmit(&mut self, datagram: &[u8]) -> Result<()> {
        if self.failing {
            return Err(TransportError::Injected("mock sink set to fail"));
        }
        self.sent.push(SentDatagram {
            bytes: datagram.to_vec(),
            timestamp: Timestamp::now(),
        });
        Ok(())
    }
}
