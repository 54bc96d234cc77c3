//! The resynchronising reader loop: turns a raw byte stream into a sequence of [`Packet`]s.
//!
//! Tolerant of garbage between frames and of single corrupted frames — the whole point of
//! MAVLink's marker-based framing is that a reader can always find its footing again.

use log::{trace, warn};

use crate::codec::frame::{self, Packet};
use crate::codec::header::{Header, Version, SIGNATURE_LEN};
use crate::error::{FrameError, TransportError};
use crate::protocol::Schema;
use crate::transport::Transport;

/// Reads and decodes frames one at a time from a [`Transport`], resynchronising on garbage and
/// silently dropping CRC/unknown-message failures (logged at `warn!`).
pub struct Framer<T: Transport> {
    transport: T,
    schema: Schema,
    ibuf: Vec<u8>,
}

impl<T: Transport> Framer<T> {
    /// Wraps a transport with a schema used to resolve message ids and field layouts.
    pub fn new(transport: T, schema: Schema) -> Self {
        Self {
            transport,
            schema,
            ibuf: Vec::new(),
        }
    }

    /// Reads and decodes the next valid frame, resynchronising past any garbage, CRC mismatch,
    /// or unknown-message-id frame it encounters along the way. Only returns `Err` on a fatal
    /// transport failure (including end-of-stream).
    pub fn next_packet(&mut self) -> Result<Packet, TransportError> {
        loop {
            let version = match self.find_marker()? {
                Some(v) => v,
                None => continue,
            };

            let header_bytes = self.take(version.header_len())?;
            let header = match Header::decode(version, &header_bytes) {
                Ok(h) => h,
                Err(_) => continue,
            };

            let sig_len = if header.has_signature() { SIGNATURE_LEN } else { 0 };
            let body = self.take(header.payload_size as usize + 2 + sig_len)?;
            let payload = &body[..header.payload_size as usize];
            let trailer = u16::from_le_bytes([
                body[header.payload_size as usize],
                body[header.payload_size as usize + 1],
            ]);

            let message = match self.schema.message_by_id(header.msgid) {
                Some(m) => m.clone(),
                None => {
                    warn!("dropping frame for unknown message id {}", header.msgid);
                    continue;
                }
            };

            if let Err(FrameError::CrcMismatch { msgid, expected, actual }) =
                frame::verify_crc(&header_bytes, payload, message.crc_extra(), trailer, header.msgid)
            {
                warn!("CRC mismatch for message id {msgid} (expected {expected:04x}, got {actual:04x}), dropping frame");
                continue;
            }

            let content = match frame::decode_content(&self.schema, &message, payload) {
                Ok(c) => c,
                Err(e) => {
                    warn!("failed to decode {}: {e}", message.name());
                    continue;
                }
            };

            trace!("decoded {} (seq {})", message.name(), header.seq);
            return Ok(Packet { message, content });
        }
    }

    /// Finds the next marker byte, discarding everything before it, and classifies its version.
    fn find_marker(&mut self) -> Result<Option<Version>, TransportError> {
        if self.ibuf.is_empty() {
            let byte = self.read_byte()?;
            return Ok(Version::from_marker(byte));
        }

        match self.ibuf.iter().position(|&b| Version::from_marker(b).is_some()) {
            Some(idx) => {
                self.ibuf.drain(..idx);
                let marker = self.ibuf.remove(0);
                Ok(Version::from_marker(marker))
            }
            None => {
                self.ibuf.clear();
                Ok(None)
            }
        }
    }

    /// Reads exactly `n` bytes, first draining `ibuf`, then topping up from the transport.
    fn take(&mut self, n: usize) -> Result<Vec<u8>, TransportError> {
        while self.ibuf.len() < n {
            let byte = self.read_byte()?;
            self.ibuf.push(byte);
        }
        Ok(self.ibuf.drain(..n).collect())
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        self.transport.read_byte().map_err(TransportError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::frame::encode_v1;
    use crate::protocol::{Content, Message, MessageField, Value};
    use crate::transport::ChannelTransport;

    fn heartbeat_schema() -> Schema {
        let mut schema = Schema::new();
        let fields = vec![MessageField::new(
            "type".to_string(),
            String::new(),
            crate::protocol::MavType::parse("uint8_t").unwrap(),
            None,
            false,
            None,
            None,
            false,
        )];
        schema
            .add_message(Message::new(0, "HEARTBEAT".to_string(), String::new(), fields, vec![]))
            .unwrap();
        schema
    }

    fn heartbeat_frame(schema: &Schema, seq: u8, value: u64) -> Vec<u8> {
        let message = schema.message_by_name("HEARTBEAT").unwrap();
        let mut content = Content::new();
        content.insert("type", Value::UInt(value));
        encode_v1(schema, message, seq, 1, 1, &content).unwrap()
    }

    #[test]
    fn resyncs_past_garbage_before_a_valid_frame() {
        let schema = heartbeat_schema();
        let mut bytes = vec![0x00, 0xAA, 0x55];
        bytes.extend(heartbeat_frame(&schema, 1, 7));

        let (transport, _written) = ChannelTransport::with_bytes(bytes);
        let mut framer = Framer::new(transport, schema);

        let packet = framer.next_packet().unwrap();
        assert_eq!(packet.message.name(), "HEARTBEAT");
        assert_eq!(packet.content.get("type"), Some(&Value::UInt(7)));
    }

    #[test]
    fn drops_frame_with_corrupted_crc_and_keeps_the_next_one() {
        let schema = heartbeat_schema();
        let mut good_then_bad = heartbeat_frame(&schema, 1, 7);
        let bad_len = good_then_bad.len();
        good_then_bad[bad_len - 1] ^= 0xFF;
        good_then_bad.extend(heartbeat_frame(&schema, 2, 9));

        let (transport, _written) = ChannelTransport::with_bytes(good_then_bad);
        let mut framer = Framer::new(transport, schema);

        let packet = framer.next_packet().unwrap();
        assert_eq!(packet.content.get("type"), Some(&Value::UInt(9)));
    }
}
