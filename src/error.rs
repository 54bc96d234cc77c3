//! Error taxonomy.
//!
//! Mirrors the split used throughout the protocol/parser layers: one enum per concern, with
//! `From` conversions at the boundaries where a higher-level error wraps a lower-level one.

use std::num::ParseIntError;

use thiserror::Error;

/// Errors raised while building a [`crate::protocol::Schema`] from XML.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field's `type` attribute does not match the MAVLink type grammar.
    #[error("invalid type `{0}`")]
    InvalidType(String),
    /// Two messages in the loaded set share the same numeric id.
    #[error("duplicate message id {id}: `{first}` and `{second}`")]
    DuplicateMessageId {
        /// Colliding id.
        id: u32,
        /// Name of the message already registered under `id`.
        first: String,
        /// Name of the message that collided with it.
        second: String,
    },
    /// A required attribute was missing on an XML element.
    #[error("missing required attribute `{attribute}` on `<{tag}>`")]
    MissingAttribute {
        /// Element tag name.
        tag: String,
        /// Missing attribute name.
        attribute: String,
    },
    /// XML tags did not nest as expected.
    #[error("unexpected tag `{0}`")]
    UnexpectedTag(String),
    /// Failed to parse a numeric attribute.
    #[error("invalid numeric value for `{field}`: {source}")]
    InvalidNumber {
        /// Name of the field/attribute that failed to parse.
        field: String,
        /// Underlying parse error.
        source: ParseIntError,
    },
    /// Malformed XML document.
    #[error("XML error: {0}")]
    Xml(String),
    /// I/O failure while reading dialect files.
    #[error("I/O error loading `{path}`: {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Fatal transport failure. Terminates the reader thread and any outstanding waits.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport returned an I/O error.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The transport reached end-of-stream.
    #[error("transport closed")]
    Closed,
}

/// Local framing errors. Never propagated to callers: absorbed by the reader loop, which logs
/// and resynchronises.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Trailer CRC did not match the computed CRC.
    #[error("CRC mismatch for message id {msgid} (expected {expected:04x}, got {actual:04x})")]
    CrcMismatch {
        /// Message id the frame claimed to carry.
        msgid: u32,
        /// CRC computed locally.
        expected: u16,
        /// CRC found in the frame trailer.
        actual: u16,
    },
    /// The frame's message id is not present in the schema.
    #[error("unknown message id {0}")]
    UnknownMessage(u32),
}

/// A packet's payload could not be decoded into field values.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// An enum-bound scalar field held a value with no matching entry.
    #[error("field `{field}` has value {value} with no matching entry in enum `{enum_name}`")]
    UnknownEnumValue {
        /// Field name.
        field: String,
        /// Enum the field is bound to.
        enum_name: String,
        /// The unresolved numeric value.
        value: u64,
    },
    /// Payload was shorter than the message's minimum encodable size (less than one field's
    /// worth of bytes after zero-padding for v2 truncation).
    #[error("payload too short: got {got} bytes, needed at least {needed}")]
    PayloadTooShort {
        /// Bytes available.
        got: usize,
        /// Bytes required.
        needed: usize,
    },
}

/// Values could not be encoded into a wire payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A name in a value mapping does not correspond to any field of the message.
    #[error("unknown field `{0}`")]
    UnknownField(String),
    /// A required field was missing from a value mapping.
    #[error("missing field `{0}`")]
    MissingField(String),
    /// Positional values were given with the wrong arity.
    #[error("expected {expected} positional values, got {got}")]
    WrongArity {
        /// Number of fields the message declares.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },
    /// A symbolic enum entry name could not be resolved against its enum.
    #[error("enum `{enum_name}` has no entry named `{entry}`")]
    UnknownEnumEntry {
        /// Enum name.
        enum_name: String,
        /// Requested entry name.
        entry: String,
    },
    /// A value's runtime type did not match the field's declared type.
    #[error("field `{field}` expects a value compatible with `{expected}`")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Expected MAVLink type name.
        expected: String,
    },
    /// Attempted to encode a v2-only message (id > 255) as a v1 frame.
    #[error("message id {0} does not fit in a MAVLink v1 frame")]
    NotV1Compatible(u32),
}

/// Top-level error type returned by [`crate::connection::Connection`] operations.
#[derive(Debug, Error)]
pub enum Error {
    /// See [`TransportError`].
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// See [`EncodeError`].
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// A wait exceeded its configured timeout.
    #[error("timed out waiting for `{0}`")]
    Timeout(String),
    /// Timed out fetching a parameter value.
    #[error("timed out fetching parameter `{0}`")]
    FailedToGetParam(String),
    /// Timed out confirming a parameter write.
    #[error("timed out setting parameter `{0}`")]
    FailedToSetParam(String),
    /// A `COMMAND_ACK` reported a result other than `MAV_RESULT_ACCEPTED`.
    #[error("command `{command}` rejected with result {result}")]
    CommandError {
        /// The `MAV_CMD` id that was sent.
        command: u32,
        /// The numeric `MAV_RESULT` returned.
        result: i64,
    },
    /// The connection has already been closed.
    #[error("connection closed")]
    Closed,
}
