use crate::TelemetryError;
use rosc::{encoder, OscMessage, OscPacket, OscType};

/// Wire-encode a single OSC message (no bundles).
pub fn encode_message(addr: &str, args: Vec<OscType>) -> Result<Vec<u8>, TelemetryError> {
    let packet = OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args,
    });
    encoder::encode(&packet).map_err(|e| TelemetryError::Encode(format!("{e:?}")))
}
