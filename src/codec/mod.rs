//! Byte-exact MAVLink v1/v2 frame encoding and decoding.

pub mod crc;
pub mod frame;
pub mod header;

pub use frame::{content_from_positional, decode_content, encode_v1, encode_v2, verify_crc, Packet};
pub use header::{Header, Version};
