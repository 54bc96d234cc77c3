//! Loads a [`Schema`](crate::protocol::Schema) from MAVLink XML dialect files.
//!
//! There is no code generation here: XML is parsed straight into the runtime [`Enum`]/[`Message`]
//! types defined in [`crate::protocol`], and dialects loaded from the same directory are merged
//! (enums by name, messages by id) into a single schema.

mod xml;

pub use xml::{load_dir, load_glob, parse_str};
