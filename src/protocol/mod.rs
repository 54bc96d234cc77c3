//! MAVLink protocol data model: the schema (enums and messages) and the `Value`/`Content` types
//! used to carry decoded field values.
//!
//! Message schema is loaded at runtime from XML (see [`crate::parser`]); this module never
//! generates per-message structs.

mod mav_type;
pub use mav_type::{MavType, Primitive};

mod units;
pub use units::Units;

mod value;
pub use value::{Content, Value};

mod enum_entry;
pub use enum_entry::EnumEntry;

mod enums;
pub use enums::Enum;

mod message_field;
pub use message_field::MessageField;

mod message;
pub use message::{Message, MessageId};

mod schema;
pub use schema::Schema;
