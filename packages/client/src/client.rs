//! Conversation channel client.
//!
//! `ConvergerClient` owns at most one socket and one joined conversation
//! channel, pushes `new_activity` messages and hands inbound activity to a
//! single callback.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Value, json};

use crate::{
    config::ClientConfig,
    domain::{Activity, ActivityPayload, ChannelTopic, ConversationId, NEW_ACTIVITY_EVENT},
    error::ClientError,
    infrastructure::phoenix::PhoenixConnector,
    transport::{Channel, JoinOutcome, JoinReceipt, Socket, SocketConnector, SocketParams},
};

/// Callback invoked for every inbound activity
pub type ActivityCallback = Arc<dyn Fn(Activity) + Send + Sync>;

type CallbackSlot = Arc<RwLock<Option<ActivityCallback>>>;

/// Connection parameter carrying the authentication token
const TOKEN_PARAM: &str = "token";

/// A conversation channel returned by [`ConvergerClient::join_conversation`]
pub struct JoinedConversation {
    pub channel: Arc<dyn Channel>,
    /// Resolves once the server accepts or rejects the join
    pub receipt: JoinReceipt,
}

/// Client for a single conversation channel
pub struct ConvergerClient {
    config: ClientConfig,
    connector: Arc<dyn SocketConnector>,
    socket: Option<Arc<dyn Socket>>,
    channel: Option<Arc<dyn Channel>>,
    on_activity: CallbackSlot,
}

impl ConvergerClient {
    /// Create a client for the Phoenix socket mounted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let connector = Arc::new(PhoenixConnector::new(config.heartbeat_interval));
        Self::with_connector(config, connector)
    }

    /// Create a client that builds its sockets through `connector`
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn SocketConnector>) -> Self {
        Self {
            config,
            connector,
            socket: None,
            channel: None,
            on_activity: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn socket(&self) -> Option<&Arc<dyn Socket>> {
        self.socket.as_ref()
    }

    pub fn channel(&self) -> Option<&Arc<dyn Channel>> {
        self.channel.as_ref()
    }

    /// Open a socket authenticated by `token`.
    ///
    /// The connection is established in the background; this returns as soon
    /// as the attempt has started. A previous socket is replaced without
    /// being closed explicitly.
    pub fn connect(&mut self, token: &str) -> Result<Arc<dyn Socket>, ClientError> {
        let params = SocketParams::from([(TOKEN_PARAM.to_string(), token.to_string())]);
        let socket = self.connector.socket(&self.config.base_url, &params)?;
        socket.connect()?;

        tracing::info!("Connecting to {}", socket.endpoint());
        self.socket = Some(Arc::clone(&socket));
        Ok(socket)
    }

    /// Join the channel of conversation `conversation_id`.
    ///
    /// The join is sent asynchronously; await the returned receipt to learn
    /// whether the server accepted it. A previously joined conversation is
    /// left first.
    pub fn join_conversation(
        &mut self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<JoinedConversation, ClientError> {
        let socket = self.socket.as_ref().ok_or(ClientError::SocketNotConnected)?;
        let topic = ChannelTopic::conversation(&conversation_id.into());

        if let Some(previous) = self.channel.take() {
            tracing::info!("Leaving '{}' before joining '{}'", previous.topic(), topic);
            previous.leave();
        }

        let channel = socket.channel(&topic, json!({}));

        let slot = Arc::clone(&self.on_activity);
        channel.on(
            NEW_ACTIVITY_EVENT,
            Arc::new(move |payload| dispatch_activity(&slot, payload)),
        );

        let receipt = channel.join();
        log_join_outcome(topic, receipt.clone());

        self.channel = Some(Arc::clone(&channel));
        Ok(JoinedConversation { channel, receipt })
    }

    /// Push a `new_activity` message with `text` on the joined conversation
    pub fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let channel = self.channel.as_ref().ok_or(ClientError::ChannelNotJoined)?;
        let payload = serde_json::to_value(ActivityPayload::new(text))?;
        channel.push(NEW_ACTIVITY_EVENT, payload)
    }

    /// Register the callback for inbound activity, replacing any previous one
    pub fn on_activity<F>(&self, callback: F)
    where
        F: Fn(Activity) + Send + Sync + 'static,
    {
        let mut slot = self
            .on_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(callback));
    }
}

impl Default for ConvergerClient {
    fn default() -> Self {
        Self::with_config(ClientConfig::default())
    }
}

fn dispatch_activity(slot: &CallbackSlot, payload: Value) {
    // Released before the call so the callback may replace itself
    let callback = slot
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    if let Some(callback) = callback {
        callback(Activity::new(payload));
    }
}

/// Log the join outcome once the server replies
fn log_join_outcome(topic: ChannelTopic, receipt: JoinReceipt) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No runtime to observe join of '{}'", topic);
        return;
    };

    runtime.spawn(async move {
        match receipt.outcome().await {
            Ok(JoinOutcome::Joined(response)) => {
                tracing::info!("Joined '{}' successfully: {}", topic, response);
            }
            Ok(JoinOutcome::Rejected(response)) => {
                tracing::warn!("Unable to join '{}': {}", topic, response);
            }
            Err(e) => {
                tracing::warn!("Join of '{}' abandoned: {}", topic, e);
            }
        }
    });
}
