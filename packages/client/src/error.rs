//! Error types for the conversation client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// A conversation was joined before `connect` was called
    #[error("Socket not connected")]
    SocketNotConnected,

    /// A message was sent before any conversation was joined
    #[error("Channel not joined")]
    ChannelNotJoined,

    /// The base URL could not be turned into a socket endpoint
    #[error("Invalid endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A frame could not be serialized
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server refused to let the client join the conversation
    #[error("Join rejected: {0}")]
    JoinRejected(serde_json::Value),

    /// The transport went away before the operation completed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
