//! Loads a dialect directory and inspects a message definition from it.
//! Run with `cargo run --example connect -- <dialect-dir> <message-name>`.

use std::env;

use mavwire::parser;

fn main() {
    env_logger::builder()
        // Suppress everything below `info` for third-party modules.
        .filter_level(log::LevelFilter::Info)
        // Allow everything from current package
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Trace)
        .init();

    let mut args = env::args().skip(1);
    let dialect_dir = args.next().expect("usage: connect <dialect-dir> <message-name>");
    let message_name = args.next().expect("usage: connect <dialect-dir> <message-name>");

    let schema = parser::load_dir(std::path::Path::new(&dialect_dir)).unwrap();
    log::info!("loaded {} messages, {} enums", schema.messages().len(), schema.enums().len());

    match schema.message_by_name(&message_name) {
        Some(message) => {
            log::info!(
                "{} (id {}): crc_extra {}, {} field(s)",
                message.name(),
                message.id(),
                message.crc_extra(),
                message.fields().len(),
            );
        }
        None => log::warn!("no message named {message_name} in this dialect set"),
    }
}
