//! Message formatting utilities for client display.

use serde_json::Value;

use crate::domain::{Activity, ChannelTopic};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an inbound activity
    ///
    /// # Arguments
    ///
    /// * `activity` - The received activity
    /// * `received_at` - Clock time the activity arrived (e.g. "12:34:56"), if known
    ///
    /// Activity without a string `text` is shown as its raw JSON payload.
    pub fn format_activity(activity: &Activity, received_at: Option<&str>) -> String {
        let body = match activity.text() {
            Some(text) => text.to_string(),
            None => activity.payload().to_string(),
        };
        match received_at {
            Some(time) => format!("\n[{}] {}\n", time, body),
            None => format!("\n{}\n", body),
        }
    }

    /// Format the banner shown once the conversation is joined
    pub fn format_joined(topic: &ChannelTopic) -> String {
        format!(
            "\nJoined '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
            topic
        )
    }

    /// Format a rejected join together with the server's response
    pub fn format_join_rejected(topic: &ChannelTopic, response: &Value) -> String {
        match response.get("reason").and_then(Value::as_str) {
            Some(reason) => format!("\nUnable to join '{}': {}\n", topic, reason),
            None => format!("\nUnable to join '{}': {}\n", topic, response),
        }
    }
}
