//! MAVLink v1/v2 frame headers: markers, layout, and flags.

use crate::error::FrameError;

/// v1 frame marker byte.
pub const MARKER_V1: u8 = 0xFE;
/// v2 frame marker byte.
pub const MARKER_V2: u8 = 0xFD;

/// Incompatibility flag bit indicating a frame carries a trailing 13-byte signature block.
pub const INCOMPAT_FLAG_SIGNED: u8 = 0x01;

/// Length, in bytes, of a v2 signature block (link id + timestamp + truncated signature).
pub const SIGNATURE_LEN: usize = 13;

/// Wire protocol version, identified by its marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// MAVLink v1, marker `0xFE`.
    V1,
    /// MAVLink v2, marker `0xFD`.
    V2,
}

impl Version {
    /// The marker byte for this version.
    pub fn marker(self) -> u8 {
        match self {
            Version::V1 => MARKER_V1,
            Version::V2 => MARKER_V2,
        }
    }

    /// Classifies a candidate marker byte, if it is one.
    pub fn from_marker(byte: u8) -> Option<Version> {
        match byte {
            MARKER_V1 => Some(Version::V1),
            MARKER_V2 => Some(Version::V2),
            _ => None,
        }
    }

    /// Header length in bytes, excluding the marker.
    pub fn header_len(self) -> usize {
        match self {
            Version::V1 => 5,
            Version::V2 => 9,
        }
    }

    /// Whether a message id fits in this version's id field.
    pub fn fits_msgid(self, msgid: u32) -> bool {
        match self {
            Version::V1 => msgid <= 0xFF,
            Version::V2 => msgid <= 0xFF_FFFF,
        }
    }
}

/// A decoded frame header (everything between the marker and the payload).
#[derive(Debug, Clone)]
pub struct Header {
    /// Wire version this header was decoded as / will be encoded as.
    pub version: Version,
    /// Payload length in bytes, as carried on the wire (post v2-truncation for v2 frames).
    pub payload_size: u8,
    /// v2-only: incompatibility flags. Always `0` for v1.
    pub incompat_flags: u8,
    /// v2-only: compatibility flags. Always `0` for v1.
    pub compat_flags: u8,
    /// Packet sequence number, wrapping `u8`.
    pub seq: u8,
    /// Sending system id.
    pub sysid: u8,
    /// Sending component id.
    pub compid: u8,
    /// Message id (fits one byte for v1, 24 bits for v2).
    pub msgid: u32,
}

impl Header {
    /// Whether this header declares a trailing signature block.
    pub fn has_signature(&self) -> bool {
        self.version == Version::V2 && self.incompat_flags & INCOMPAT_FLAG_SIGNED != 0
    }

    /// Serialises this header, excluding the marker byte.
    pub fn encode(&self) -> Vec<u8> {
        match self.version {
            Version::V1 => vec![self.payload_size, self.seq, self.sysid, self.compid, self.msgid as u8],
            Version::V2 => {
                let id = self.msgid.to_le_bytes();
                vec![
                    self.payload_size,
                    self.incompat_flags,
                    self.compat_flags,
                    self.seq,
                    self.sysid,
                    self.compid,
                    id[0],
                    id[1],
                    id[2],
                ]
            }
        }
    }

    /// Decodes a header body (excluding the marker) of the expected length for `version`.
    pub fn decode(version: Version, bytes: &[u8]) -> Result<Header, FrameError> {
        let expected = version.header_len();
        if bytes.len() != expected {
            return Err(FrameError::UnknownMessage(0));
        }
        Ok(match version {
            Version::V1 => Header {
                version,
                payload_size: bytes[0],
                incompat_flags: 0,
                compat_flags: 0,
                seq: bytes[1],
                sysid: bytes[2],
                compid: bytes[3],
                msgid: bytes[4] as u32,
            },
            Version::V2 => Header {
                version,
                payload_size: bytes[0],
                incompat_flags: bytes[1],
                compat_flags: bytes[2],
                seq: bytes[3],
                sysid: bytes[4],
                compid: bytes[5],
                msgid: u32::from_le_bytes([bytes[6], bytes[7], bytes[8], 0]),
            },
        })
    }
}
