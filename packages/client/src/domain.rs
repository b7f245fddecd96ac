//! Domain values exchanged with the conversation channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event name used for activity in both directions
pub const NEW_ACTIVITY_EVENT: &str = "new_activity";

/// Prefix of every conversation channel topic
pub const CONVERSATION_TOPIC_PREFIX: &str = "conversation:";

/// Identifier of a conversation, as given by the caller
///
/// Accepts strings and integers; the identifier is used verbatim when
/// composing the channel topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for ConversationId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! conversation_id_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConversationId {
                fn from(value: $ty) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

conversation_id_from_int!(i32, i64, u32, u64, usize);

/// Name of a channel on the socket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelTopic(String);

impl ChannelTopic {
    /// Topic of the channel scoped to one conversation: `conversation:<id>`
    pub fn conversation(id: &ConversationId) -> Self {
        Self(format!("{}{}", CONVERSATION_TOPIC_PREFIX, id.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ChannelTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of an outbound `new_activity` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub text: String,
}

impl ActivityPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Inbound `new_activity` event
///
/// The payload is whatever the server sent; it is not validated, so
/// activity without a string `text` still reaches the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity(Value);

impl Activity {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// The `text` field, when the server sent a string
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    pub fn into_payload(self) -> Value {
        self.0
    }
}

impl From<Value> for Activity {
    fn from(payload: Value) -> Self {
        Self(payload)
    }
}
