//! CRC-16/CCITT (the MCRF4XX variant used by MAVLink), and the per-message "CRC extra" byte
//! derived from a message's schema.

use crc_any::CRCu16;

use crate::protocol::MessageField;

/// Computes the MAVLink frame CRC over an arbitrary sequence of byte slices.
///
/// Callers feed `header_without_marker`, then `payload`, then the single `crc_extra` byte, in
/// that order, matching the wire CRC defined in the frame codec.
pub fn digest<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> u16 {
    let mut crc = CRCu16::crc16mcrf4cc();
    for chunk in chunks {
        crc.digest(chunk);
    }
    crc.get_crc()
}

/// Computes a message's CRC-extra byte from its name and reordered base fields.
///
/// The accumulator is seeded the same way as the frame CRC (CRC-16/CCITT, initial `0xFFFF`), fed
/// the message name, a space, and then for each base field (in `fields_reordered` order,
/// extensions excluded): its canonical (unsigned, unversioned) type name, a space, its field
/// name, a space, and — for array fields — a single byte holding the element count. The result
/// folds the two CRC bytes together with XOR.
pub fn message_crc_extra<'a>(name: &str, fields_reordered: impl Iterator<Item = &'a MessageField>) -> u8 {
    let mut crc = CRCu16::crc16mcrf4cc();
    crc.digest(name.as_bytes());
    crc.digest(b" ");

    for field in fields_reordered {
        let ty = field.r#type();
        crc.digest(ty.crc_type_name().as_bytes());
        crc.digest(b" ");
        crc.digest(field.name().as_bytes());
        crc.digest(b" ");

        let count = ty.count();
        if count > 1 {
            crc.digest(&[count as u8]);
        }
    }

    let value = crc.get_crc();
    ((value & 0xFF) ^ (value >> 8)) as u8
}
