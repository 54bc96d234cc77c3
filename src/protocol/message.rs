use std::cmp::Reverse;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::MessageField;
use crate::codec::crc::message_crc_extra;

/// Type of a MAVLink message id (v1-compatible ids are 0..=255; v2 allows the full 24-bit range).
pub type MessageId = u32;

/// A MAVLink message definition.
///
/// `fields_reordered`, `all_fields`, `all_fields_reordered`, `expected_payload_size`, and
/// `crc_extra` are all derived from `fields`/`field_extensions` and computed once, here, in
/// [`Message::new`] — messages are immutable once loaded.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message {
    id: MessageId,
    name: String,
    description: String,
    fields: Vec<MessageField>,
    field_extensions: Vec<MessageField>,
    /// Indices into `fields`, sorted by descending primitive element size (stable).
    reordered_indices: Vec<usize>,
    expected_payload_size: usize,
    crc_extra: u8,
}

impl Message {
    /// Default constructor. Computes `fields_reordered`, `expected_payload_size`, and
    /// `crc_extra` from `fields`/`field_extensions`.
    pub fn new(
        id: MessageId,
        name: String,
        description: String,
        fields: Vec<MessageField>,
        field_extensions: Vec<MessageField>,
    ) -> Self {
        let mut reordered_indices: Vec<usize> = (0..fields.len()).collect();
        reordered_indices.sort_by_key(|&i| Reverse(fields[i].r#type().primitive().size()));

        let expected_payload_size = fields.iter().map(|f| f.r#type().size()).sum();

        let crc_extra = message_crc_extra(
            &name,
            reordered_indices.iter().map(|&i| &fields[i]),
        );

        Self {
            id,
            name,
            description,
            fields,
            field_extensions,
            reordered_indices,
            expected_payload_size,
            crc_extra,
        }
    }

    /// Unique message id.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Base (non-extension) fields, in declaration order.
    pub fn fields(&self) -> &[MessageField] {
        &self.fields
    }

    /// v2-only extension fields, in declaration order.
    pub fn field_extensions(&self) -> &[MessageField] {
        &self.field_extensions
    }

    /// Base fields sorted by descending primitive byte size (stable for equal size).
    pub fn fields_reordered(&self) -> impl Iterator<Item = &MessageField> + '_ {
        self.reordered_indices.iter().map(move |&i| &self.fields[i])
    }

    /// `fields ++ field_extensions`, in declaration order.
    pub fn all_fields(&self) -> impl Iterator<Item = &MessageField> + '_ {
        self.fields.iter().chain(self.field_extensions.iter())
    }

    /// `fields_reordered ++ field_extensions`: the wire field order. Extensions are appended
    /// after reordering and are never themselves reordered.
    pub fn all_fields_reordered(&self) -> impl Iterator<Item = &MessageField> + '_ {
        self.fields_reordered().chain(self.field_extensions.iter())
    }

    /// Total byte size of `fields` only (the MAVLink v1 payload size).
    pub fn expected_payload_size(&self) -> usize {
        self.expected_payload_size
    }

    /// Total byte size of `fields ++ field_extensions` (the MAVLink v2 payload size before
    /// trailing-zero trimming).
    pub fn expected_payload_size_v2(&self) -> usize {
        self.expected_payload_size + self.field_extensions.iter().map(|f| f.r#type().size()).sum::<usize>()
    }

    /// The per-message CRC seed mixed into every frame CRC.
    pub fn crc_extra(&self) -> u8 {
        self.crc_extra
    }

    /// Whether this message id fits in MAVLink v1's single id byte.
    pub fn is_v1_compatible(&self) -> bool {
        self.id <= 255
    }

    /// Looks up a field (base or extension) by name.
    pub fn field_by_name(&self, name: &str) -> Option<&MessageField> {
        self.all_fields().find(|f| f.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MavType;

    fn field(name: &str, ty: &str, extension: bool) -> MessageField {
        MessageField::new(
            name.to_string(),
            String::new(),
            MavType::parse(ty).unwrap(),
            None,
            false,
            None,
            None,
            extension,
        )
    }

    #[test]
    fn reorders_by_descending_size_stably() {
        let fields = vec![
            field("a_u8", "uint8_t", false),
            field("b_u32", "uint32_t", false),
            field("c_u8", "uint8_t", false),
            field("d_u16", "uint16_t", false),
            field("e_u32", "uint32_t", false),
        ];
        let msg = Message::new(1, "TEST".to_string(), String::new(), fields, vec![]);
        let names: Vec<_> = msg.fields_reordered().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b_u32", "e_u32", "d_u16", "a_u8", "c_u8"]);
    }

    #[test]
    fn extensions_follow_reordered_base_fields_untouched() {
        let fields = vec![field("a_u8", "uint8_t", false), field("b_u32", "uint32_t", false)];
        let extensions = vec![field("ext_u32", "uint32_t", true), field("ext_u8", "uint8_t", true)];
        let msg = Message::new(1, "TEST".to_string(), String::new(), fields, extensions);
        let names: Vec<_> = msg.all_fields_reordered().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b_u32", "a_u8", "ext_u32", "ext_u8"]);
    }

    #[test]
    fn expected_payload_size_counts_base_fields_only() {
        let fields = vec![field("a", "uint32_t", false), field("b", "uint8_t", false)];
        let extensions = vec![field("c", "uint32_t", true)];
        let msg = Message::new(0, "TEST".to_string(), String::new(), fields, extensions);
        assert_eq!(msg.expected_payload_size(), 5);
        assert_eq!(msg.expected_payload_size_v2(), 9);
    }

    #[test]
    fn v1_compatibility_by_id() {
        let msg = Message::new(255, "A".to_string(), String::new(), vec![], vec![]);
        assert!(msg.is_v1_compatible());
        let msg = Message::new(256, "B".to_string(), String::new(), vec![], vec![]);
        assert!(!msg.is_v1_compatible());
    }
}
