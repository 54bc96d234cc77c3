//! Host-side MAVLink telemetry/command library.
//!
//! Message definitions are loaded from MAVLink XML dialect files at runtime ([`parser`]) into a
//! [`protocol::Schema`]; there is no code generation step and no per-message struct. [`codec`]
//! turns schema-resolved values into byte-exact v1/v2 frames and back; [`framer`] wraps a
//! [`transport::Transport`] with a resynchronising reader loop; [`dispatch`] fans decoded packets
//! out to a last-value pool, an optional keep-all history, and predicate-matched waiters; and
//! [`connection`] ties all of it together behind a small request/response API.
//!
//! ```ignore
//! use mavwire::connection::{Connection, ConnectionConfig};
//! use mavwire::parser;
//!
//! let schema = parser::load_dir(std::path::Path::new("dialects"))?;
//! // `reader` and `writer` are two handles onto the same serial link.
//! let connection = Connection::open(reader, writer, schema, ConnectionConfig::new());
//! let speed = connection.param_value("WPNAV_SPEED")?;
//! ```

pub mod codec;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod framer;
pub mod parser;
pub mod protocol;
pub mod transport;

pub use error::Error;
