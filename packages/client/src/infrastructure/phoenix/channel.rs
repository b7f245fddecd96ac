//! Channel handle and inbound dispatch.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use serde_json::Value;

use crate::{
    domain::ChannelTopic,
    error::ClientError,
    transport::{Channel, EventHandler, JoinOutcome, JoinReceipt, JoinResolver},
};

use super::{
    frame::{Frame, PHX_CLOSE, PHX_ERROR, PHX_JOIN, PHX_LEAVE, PHX_REPLY, Reply, ReplyStatus},
    lock,
    socket::{ConnectionGuard, SocketShared},
};

/// Per-channel state shared between the handle and the socket router
pub(super) struct ChannelState {
    topic: ChannelTopic,
    join_ref: String,
    params: Value,
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
    join_sent: AtomicBool,
    resolver: JoinResolver,
    receipt: JoinReceipt,
}

impl ChannelState {
    pub(super) fn new(topic: ChannelTopic, join_ref: String, params: Value) -> Self {
        let (resolver, receipt) = JoinReceipt::pending();
        Self {
            topic,
            join_ref,
            params,
            handlers: Mutex::new(HashMap::new()),
            join_sent: AtomicBool::new(false),
            resolver,
            receipt,
        }
    }

    pub(super) fn topic(&self) -> &ChannelTopic {
        &self.topic
    }

    /// Handle a frame routed to this channel's topic
    pub(super) fn handle(&self, frame: Frame) {
        if let Some(join_ref) = frame.join_ref.as_deref()
            && join_ref != self.join_ref
        {
            tracing::debug!(
                "Dropping stale '{}' on '{}' (join_ref {} != {})",
                frame.event,
                self.topic,
                join_ref,
                self.join_ref
            );
            return;
        }

        match frame.event.as_str() {
            PHX_REPLY => self.handle_reply(frame.msg_ref.as_deref(), frame.payload),
            PHX_ERROR => {
                tracing::warn!("Channel '{}' errored: {}", self.topic, frame.payload);
                self.resolver.close();
            }
            PHX_CLOSE => {
                tracing::info!("Channel '{}' closed by server", self.topic);
                self.resolver.close();
            }
            event => self.dispatch(event, frame.payload),
        }
    }

    /// Abandon a pending join
    pub(super) fn close(&self) {
        self.resolver.close();
    }

    fn handle_reply(&self, msg_ref: Option<&str>, payload: Value) {
        let reply: Reply = match serde_json::from_value(payload) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Malformed reply on '{}': {}", self.topic, e);
                return;
            }
        };

        if msg_ref != Some(self.join_ref.as_str()) {
            tracing::debug!(
                "Reply {:?} on '{}': {:?} {}",
                msg_ref,
                self.topic,
                reply.status,
                reply.response
            );
            return;
        }

        let outcome = match reply.status {
            ReplyStatus::Ok => JoinOutcome::Joined(reply.response),
            ReplyStatus::Error | ReplyStatus::Other => JoinOutcome::Rejected(reply.response),
        };
        self.resolver.resolve(outcome);
    }

    fn dispatch(&self, event: &str, payload: Value) {
        // Handlers run outside the lock so they may register more handlers
        let handlers = lock(&self.handlers)
            .get(event)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::debug!("No handler for '{}' on '{}'", event, self.topic);
            return;
        }

        for handler in handlers {
            handler(payload.clone());
        }
    }
}

/// Handle on a channel of a [`PhoenixSocket`](super::PhoenixSocket)
///
/// The channel keeps the connection open even after every socket handle is
/// dropped.
pub struct PhoenixChannel {
    state: Arc<ChannelState>,
    socket: Arc<SocketShared>,
    _guard: Arc<ConnectionGuard>,
}

impl PhoenixChannel {
    pub(super) fn new(
        state: Arc<ChannelState>,
        socket: Arc<SocketShared>,
        guard: Arc<ConnectionGuard>,
    ) -> Self {
        Self {
            state,
            socket,
            _guard: guard,
        }
    }

    fn frame(&self, msg_ref: String, event: &str, payload: Value) -> Frame {
        Frame {
            join_ref: Some(self.state.join_ref.clone()),
            msg_ref: Some(msg_ref),
            topic: self.state.topic.to_string(),
            event: event.to_string(),
            payload,
        }
    }
}

impl Channel for PhoenixChannel {
    fn topic(&self) -> ChannelTopic {
        self.state.topic.clone()
    }

    fn join(&self) -> JoinReceipt {
        if self.state.join_sent.swap(true, Ordering::SeqCst) {
            tracing::warn!("Channel '{}' is already joining", self.state.topic);
            return self.state.receipt.clone();
        }

        let frame = self.frame(
            self.state.join_ref.clone(),
            PHX_JOIN,
            self.state.params.clone(),
        );
        if let Err(e) = self.socket.send(frame) {
            tracing::warn!("Failed to queue join for '{}': {}", self.state.topic, e);
            self.state.close();
        }

        self.state.receipt.clone()
    }

    fn on(&self, event: &str, handler: EventHandler) {
        lock(&self.state.handlers)
            .entry(event.to_string())
            .or_default()
            .push(handler);
    }

    fn push(&self, event: &str, payload: Value) -> Result<(), ClientError> {
        if !self.state.join_sent.load(Ordering::SeqCst) {
            return Err(ClientError::ChannelNotJoined);
        }

        let frame = self.frame(self.socket.next_ref(), event, payload);
        self.socket.send(frame)
    }

    fn leave(&self) {
        let frame = self.frame(self.socket.next_ref(), PHX_LEAVE, Value::Object(Default::default()));
        if let Err(e) = self.socket.send(frame) {
            tracing::debug!("Leave for '{}' not sent: {}", self.state.topic, e);
        }
        self.socket.remove_channel(&self.state);
        self.state.close();
    }
}
