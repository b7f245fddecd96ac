//! Conversation channel client for Converger.
//!
//! Connects to a Phoenix Channels endpoint over WebSocket, joins a single
//! `conversation:<id>` channel, pushes `new_activity` messages and forwards
//! inbound activity to one registered callback.
//!
//! ```no_run
//! use converger_client::{Activity, ConvergerClient};
//!
//! # async fn run() -> Result<(), converger_client::ClientError> {
//! let mut client = ConvergerClient::default();
//! client.on_activity(|activity: Activity| println!("{}", activity.payload()));
//! client.connect("secret-token")?;
//! let joined = client.join_conversation("abc123")?;
//! joined.receipt.outcome().await?;
//! client.send_message("hello")?;
//! # Ok(())
//! # }
//! ```

// layers
pub mod domain;
pub mod infrastructure;
pub mod transport;

pub mod client;
pub mod config;
pub mod error;
pub mod formatter;
pub mod runner;

pub use client::{ConvergerClient, JoinedConversation};
pub use config::ClientConfig;
pub use domain::{Activity, ActivityPayload, ChannelTopic, ConversationId};
pub use error::ClientError;
pub use infrastructure::phoenix::PhoenixConnector;
pub use transport::{Channel, JoinOutcome, JoinReceipt, Socket, SocketConnector};
