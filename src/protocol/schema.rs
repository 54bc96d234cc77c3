use std::collections::HashMap;
use std::sync::Arc;

use super::{Enum, Message, MessageId};
use crate::error::SchemaError;

/// An immutable, shareable collection of message and enum definitions.
///
/// Built once (from one or more XML documents, merged), then passed by [`Arc`] into any number
/// of [`crate::connection::Connection`]s. There is no process-wide singleton: callers hold an
/// explicit handle, which keeps schema construction testable.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    enums: HashMap<String, Enum>,
    messages_by_name: HashMap<String, Arc<Message>>,
    messages_by_id: HashMap<MessageId, Arc<Message>>,
}

impl Schema {
    /// An empty schema, useful as a fold seed when merging documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or merges) an enum definition.
    ///
    /// If an enum with the same name already exists, `other`'s entries are appended to it
    /// (§4.1's merge-by-name rule); otherwise it is inserted fresh.
    pub fn add_enum(&mut self, e: Enum) {
        match self.enums.get_mut(e.name()) {
            Some(existing) => existing.merge(e),
            None => {
                self.enums.insert(e.name().to_string(), e);
            }
        }
    }

    /// Registers a message definition.
    ///
    /// Fails if a message with the same numeric id is already registered under a different name.
    pub fn add_message(&mut self, message: Message) -> Result<(), SchemaError> {
        if let Some(existing) = self.messages_by_id.get(&message.id()) {
            if existing.name() != message.name() {
                return Err(SchemaError::DuplicateMessageId {
                    id: message.id(),
                    first: existing.name().to_string(),
                    second: message.name().to_string(),
                });
            }
        }
        let message = Arc::new(message);
        self.messages_by_id.insert(message.id(), message.clone());
        self.messages_by_name.insert(message.name().to_string(), message);
        Ok(())
    }

    /// Merges another schema's enums and messages into this one.
    pub fn merge(&mut self, other: Schema) -> Result<(), SchemaError> {
        for (_, e) in other.enums {
            self.add_enum(e);
        }
        for (_, message) in other.messages_by_name {
            let message = Arc::try_unwrap(message).unwrap_or_else(|arc| (*arc).clone());
            self.add_message(message)?;
        }
        Ok(())
    }

    /// Looks up an enum by name.
    pub fn r#enum(&self, name: &str) -> Option<&Enum> {
        self.enums.get(name)
    }

    /// Looks up a message by name.
    pub fn message_by_name(&self, name: &str) -> Option<&Arc<Message>> {
        self.messages_by_name.get(name)
    }

    /// Looks up a message by numeric id.
    pub fn message_by_id(&self, id: MessageId) -> Option<&Arc<Message>> {
        self.messages_by_id.get(&id)
    }

    /// All registered enums.
    pub fn enums(&self) -> &HashMap<String, Enum> {
        &self.enums
    }

    /// All registered messages, keyed by name.
    pub fn messages(&self) -> &HashMap<String, Arc<Message>> {
        &self.messages_by_name
    }
}
