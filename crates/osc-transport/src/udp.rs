use crate::types::MAX_DATAGRAM_LEN;
use crate::{DatagramSink, Result, SinkInfo, TransportError};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Unicast UDP sink bound to an ephemeral local port.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn resolve(target: &str) -> Result<SocketAddr> {
        let all: Vec<SocketAddr> = target
            .to_socket_addrs()
            .map_err(|e| TransportError::UnresolvedTarget(format!("{target}: {e}")))?
            .collect();
        // Prefer IPv4 so "localhost" matches receivers bound to 127.0.0.1
        all.iter()
            .find(|a| a.is_ipv4())
            .or_else(|| all.first())
            .copied()
            .ok_or_else(|| TransportError::UnresolvedTarget(target.to_string()))
    }
}

impl DatagramSink for UdpSink {
    fn open(target: &str) -> Result<Self> {
        let target = Self::resolve(target)?;
        let local = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).map_err(|e| TransportError::Io(e.to_string()))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        tracing::debug!(%target, "udp sink opened");
        Ok(Self { socket, target })
    }

    fn info(&self) -> SinkInfo {
        SinkInfo {
            target: self.target.to_string(),
            driver: "udp".to_string(),
        }
    }

    fn transmit(&mut self, datagram: &[u8]) -> Result<()> {
        if datagram.len() > MAX_DATAGRAM_LEN {
            return Err(TransportError::Oversized(datagram.len()));
        }
        match self.socket.send_to(datagram, self.target) {
            Ok(_) => Ok(()),
            // Non-blocking socket with a full buffer: drop the datagram
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                Err(TransportError::Io("send buffer full".to_string()))
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}
