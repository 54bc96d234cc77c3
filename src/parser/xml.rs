//! Parses MAVLink 1.0 XML message definitions into a [`Schema`].
//!
//! Handles exactly the grammar named in the schema loader design: `<mavlink><enums><enum><entry
//! .../></enum></enums><messages><message><description/><field/>...<extensions/><field/>...
//! </message></messages></mavlink>`. Unrecognised child elements are ignored.

use std::fs;
use std::path::Path;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::SchemaError;
use crate::protocol::{Enum, EnumEntry, MavType, Message, MessageField, Schema, Units};

#[derive(Debug, Default)]
struct RawEntry {
    name: String,
    value: String,
    description: String,
    params: Vec<(u32, String)>,
}

#[derive(Debug, Default)]
struct RawEnum {
    name: String,
    description: String,
    entries: Vec<RawEntry>,
}

#[derive(Debug, Default)]
struct RawField {
    field_type: String,
    name: String,
    description: String,
    r#enum: Option<String>,
    units: Option<String>,
    bitmask: bool,
    print_format: Option<String>,
    extension: bool,
}

#[derive(Debug, Default)]
struct RawMessage {
    id: String,
    name: String,
    description: String,
    fields: Vec<RawField>,
}

/// Parses a single MAVLink XML document (already loaded into a string) into a [`Schema`].
pub fn parse_str(xml: &str) -> Result<Schema, SchemaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tag_stack: Vec<String> = Vec::new();

    let mut enums: Vec<RawEnum> = Vec::new();
    let mut messages: Vec<RawMessage> = Vec::new();

    let mut cur_enum: Option<RawEnum> = None;
    let mut cur_entry: Option<RawEntry> = None;
    let mut cur_message: Option<RawMessage> = None;
    let mut cur_field: Option<RawField> = None;
    let mut in_extensions = false;

    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SchemaError::Xml(e.to_string()))?
        {
            Event::Eof => break,
            Event::Start(e) => {
                let name = tag_name(&e);
                open_tag(
                    &name,
                    &e,
                    &mut cur_enum,
                    &mut cur_entry,
                    &mut cur_message,
                    &mut cur_field,
                    &mut in_extensions,
                )?;
                tag_stack.push(name);
            }
            Event::Empty(e) => {
                let name = tag_name(&e);
                open_tag(
                    &name,
                    &e,
                    &mut cur_enum,
                    &mut cur_entry,
                    &mut cur_message,
                    &mut cur_field,
                    &mut in_extensions,
                )?;
                close_tag(
                    &name,
                    &mut cur_enum,
                    &mut cur_entry,
                    &mut cur_message,
                    &mut cur_field,
                    &mut in_extensions,
                    &mut enums,
                    &mut messages,
                );
            }
            Event::End(e) => {
                let name = tag_name_end(&e);
                close_tag(
                    &name,
                    &mut cur_enum,
                    &mut cur_entry,
                    &mut cur_message,
                    &mut cur_field,
                    &mut in_extensions,
                    &mut enums,
                    &mut messages,
                );
                tag_stack.pop();
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| SchemaError::Xml(e.to_string()))?
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                match tag_stack.last().map(String::as_str) {
                    Some("description") => match tag_stack.get(tag_stack.len().wrapping_sub(2)).map(String::as_str) {
                        Some("enum") => {
                            if let Some(e) = cur_enum.as_mut() {
                                e.description = text;
                            }
                        }
                        Some("entry") => {
                            if let Some(e) = cur_entry.as_mut() {
                                e.description = text;
                            }
                        }
                        Some("message") => {
                            if let Some(m) = cur_message.as_mut() {
                                m.description = text;
                            }
                        }
                        _ => {}
                    },
                    Some("param") => {
                        if let Some(entry) = cur_entry.as_mut() {
                            if let Some(last) = entry.params.last_mut() {
                                last.1 = text;
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    build_schema(enums, messages)
}

/// Loads and merges every `*.xml` file under `dir` (non-recursive) into one [`Schema`].
pub fn load_dir(dir: &Path) -> Result<Schema, SchemaError> {
    let pattern = dir.join("*.xml");
    let pattern = pattern.to_string_lossy().to_string();
    load_glob(&pattern)
}

/// Loads and merges every file matching `pattern` (a `glob`-style pattern) into one [`Schema`].
pub fn load_glob(pattern: &str) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    let paths = glob::glob(pattern).map_err(|e| SchemaError::Xml(e.to_string()))?;
    for entry in paths {
        let path = entry.map_err(|e| SchemaError::Io {
            path: pattern.to_string(),
            source: e.into_error(),
        })?;
        let contents = fs::read_to_string(&path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let doc_schema = parse_str(&contents)?;
        schema.merge(doc_schema)?;
    }
    Ok(schema)
}

#[allow(clippy::too_many_arguments)]
fn open_tag(
    name: &str,
    e: &BytesStart,
    cur_enum: &mut Option<RawEnum>,
    cur_entry: &mut Option<RawEntry>,
    cur_message: &mut Option<RawMessage>,
    cur_field: &mut Option<RawField>,
    in_extensions: &mut bool,
) -> Result<(), SchemaError> {
    match name {
        "enum" => {
            *cur_enum = Some(RawEnum {
                name: required_attr(e, "name", "enum")?,
                ..Default::default()
            });
        }
        "entry" => {
            *cur_entry = Some(RawEntry {
                name: required_attr(e, "name", "entry")?,
                value: required_attr(e, "value", "entry")?,
                ..Default::default()
            });
        }
        "param" => {
            if let Some(entry) = cur_entry.as_mut() {
                let index = required_attr(e, "index", "param")?
                    .parse::<u32>()
                    .map_err(|source| SchemaError::InvalidNumber {
                        field: "param/index".to_string(),
                        source,
                    })?;
                entry.params.push((index, String::new()));
            }
        }
        "message" => {
            *cur_message = Some(RawMessage {
                id: required_attr(e, "id", "message")?,
                name: required_attr(e, "name", "message")?,
                ..Default::default()
            });
            *in_extensions = false;
        }
        "extensions" => {
            *in_extensions = true;
        }
        "field" => {
            *cur_field = Some(RawField {
                field_type: required_attr(e, "type", "field")?,
                name: required_attr(e, "name", "field")?,
                r#enum: optional_attr(e, "enum"),
                units: optional_attr(e, "units"),
                bitmask: optional_attr(e, "display").as_deref() == Some("bitmask"),
                print_format: optional_attr(e, "print_format"),
                extension: *in_extensions,
                ..Default::default()
            });
        }
        _ => {}
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn close_tag(
    name: &str,
    cur_enum: &mut Option<RawEnum>,
    cur_entry: &mut Option<RawEntry>,
    cur_message: &mut Option<RawMessage>,
    cur_field: &mut Option<RawField>,
    in_extensions: &mut bool,
    enums: &mut Vec<RawEnum>,
    messages: &mut Vec<RawMessage>,
) {
    match name {
        "entry" => {
            if let (Some(mut enum_builder), Some(entry)) = (cur_enum.take(), cur_entry.take()) {
                enum_builder.entries.push(entry);
                *cur_enum = Some(enum_builder);
            }
        }
        "enum" => {
            if let Some(e) = cur_enum.take() {
                enums.push(e);
            }
        }
        "field" => {
            if let (Some(mut msg), Some(field)) = (cur_message.take(), cur_field.take()) {
                msg.fields.push(field);
                *cur_message = Some(msg);
            }
        }
        "message" => {
            if let Some(m) = cur_message.take() {
                messages.push(m);
            }
            *in_extensions = false;
        }
        _ => {}
    }
}

fn build_schema(raw_enums: Vec<RawEnum>, raw_messages: Vec<RawMessage>) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();

    for raw in raw_enums {
        let mut entries = Vec::with_capacity(raw.entries.len());
        for entry in raw.entries {
            let value = entry.value.parse::<u64>().map_err(|source| SchemaError::InvalidNumber {
                field: format!("entry[{}]/value", entry.name),
                source,
            })?;
            let mut params = entry.params;
            params.sort_by_key(|(index, _)| *index);
            entries.push(EnumEntry::new(
                entry.name,
                value,
                entry.description,
                params.into_iter().map(|(_, desc)| desc).collect(),
            ));
        }
        schema.add_enum(Enum::new(raw.name, raw.description, entries));
    }

    for raw in raw_messages {
        let id = raw.id.parse::<u32>().map_err(|source| SchemaError::InvalidNumber {
            field: format!("message[{}]/id", raw.name),
            source,
        })?;

        let mut fields = Vec::new();
        let mut field_extensions = Vec::new();
        for f in raw.fields {
            let r#type = MavType::parse(&f.field_type)?;
            // An unrecognised `units` string is decorative metadata lost, not a malformed
            // document: log it and carry on rather than failing the whole dialect load.
            let units = f.units.and_then(|u| match Units::parse(&u) {
                Ok(units) => Some(units),
                Err(_) => {
                    warn!("unrecognised units `{u}` on field `{}`, dropping", f.name);
                    None
                }
            });
            let field = MessageField::new(f.name, f.description, r#type, f.r#enum, f.bitmask, units, f.print_format, f.extension);
            if f.extension {
                field_extensions.push(field);
            } else {
                fields.push(field);
            }
        }

        schema.add_message(Message::new(id, raw.name, raw.description, fields, field_extensions))?;
    }

    Ok(schema)
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn tag_name_end(e: &quick_xml::events::BytesEnd) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn required_attr(e: &BytesStart, name: &str, tag: &str) -> Result<String, SchemaError> {
    optional_attr(e, name).ok_or_else(|| SchemaError::MissingAttribute {
        tag: tag.to_string(),
        attribute: name.to_string(),
    })
}

fn optional_attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == name.as_bytes() {
            Some(String::from_utf8_lossy(a.value.as_ref()).to_string())
        } else {
            None
        }
    })
}
