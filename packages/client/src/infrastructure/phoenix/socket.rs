//! Socket handle and the background connection task.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::protocol::Message};
use url::Url;

use crate::{
    config::DEFAULT_HEARTBEAT_INTERVAL,
    domain::ChannelTopic,
    error::ClientError,
    transport::{Channel, Socket, SocketConnector, SocketParams},
};

use super::{
    channel::{ChannelState, PhoenixChannel},
    endpoint::{display_endpoint, endpoint_url},
    frame::{Frame, PHX_CLOSE},
    lock,
};

/// Creates [`PhoenixSocket`]s
#[derive(Debug, Clone, Copy)]
pub struct PhoenixConnector {
    heartbeat_interval: Duration,
}

impl PhoenixConnector {
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for PhoenixConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}

impl SocketConnector for PhoenixConnector {
    fn socket(
        &self,
        base_url: &str,
        params: &SocketParams,
    ) -> Result<Arc<dyn Socket>, ClientError> {
        let endpoint = endpoint_url(base_url, params)?;
        Ok(Arc::new(PhoenixSocket::new(endpoint, self.heartbeat_interval)))
    }
}

/// State shared between the socket handle, its channels and the connection task
pub(super) struct SocketShared {
    outbound: mpsc::UnboundedSender<Frame>,
    next_ref: AtomicU64,
    channels: Mutex<HashMap<String, Arc<ChannelState>>>,
    // Set under the `channels` lock once the connection is gone
    closed: AtomicBool,
}

impl SocketShared {
    pub(super) fn next_ref(&self) -> String {
        (self.next_ref.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }

    /// Queue a frame for the connection task
    pub(super) fn send(&self, frame: Frame) -> Result<(), ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionClosed);
        }
        self.outbound
            .send(frame)
            .map_err(|_| ClientError::ConnectionClosed)
    }

    pub(super) fn remove_channel(&self, state: &Arc<ChannelState>) {
        let mut channels = lock(&self.channels);
        let topic = state.topic().as_str();
        if channels
            .get(topic)
            .is_some_and(|current| Arc::ptr_eq(current, state))
        {
            channels.remove(topic);
        }
    }

    /// Route one inbound text message to its channel
    fn route(&self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping undecodable frame: {}", e);
                return;
            }
        };

        let Some(channel) = lock(&self.channels).get(&frame.topic).cloned() else {
            tracing::debug!(
                "No channel for topic '{}', dropping '{}'",
                frame.topic,
                frame.event
            );
            return;
        };

        let closed = frame.event == PHX_CLOSE;
        channel.handle(frame);
        if closed {
            self.remove_channel(&channel);
        }
    }

    /// Register a channel, or abandon it right away if the connection is gone
    fn register(&self, state: &Arc<ChannelState>) {
        let mut channels = lock(&self.channels);
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!("Connection closed, '{}' cannot join", state.topic());
            state.close();
            return;
        }

        if let Some(previous) = channels.insert(state.topic().to_string(), Arc::clone(state)) {
            tracing::debug!("Replacing channel for '{}'", previous.topic());
            previous.close();
        }
    }

    /// Abandon every channel after the connection is gone
    fn close_all(&self) {
        let channels: Vec<_> = {
            let mut channels = lock(&self.channels);
            self.closed.store(true, Ordering::SeqCst);
            channels.drain().map(|(_, state)| state).collect()
        };
        for channel in channels {
            channel.close();
        }
    }
}

/// Stops the connection task when the last socket or channel handle is dropped
#[derive(Default)]
pub(super) struct ConnectionGuard {
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

/// Phoenix socket over a single WebSocket connection
pub struct PhoenixSocket {
    endpoint: Url,
    heartbeat_interval: Duration,
    shared: Arc<SocketShared>,
    // Frames queue here until `connect` hands the receiver to the connection task
    pending: Mutex<Option<mpsc::UnboundedReceiver<Frame>>>,
    guard: Arc<ConnectionGuard>,
}

impl PhoenixSocket {
    pub fn new(endpoint: Url, heartbeat_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            endpoint,
            heartbeat_interval,
            shared: Arc::new(SocketShared {
                outbound: tx,
                next_ref: AtomicU64::new(0),
                channels: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
            pending: Mutex::new(Some(rx)),
            guard: Arc::new(ConnectionGuard::default()),
        }
    }

    #[cfg(test)]
    fn take_outbound(&self) -> mpsc::UnboundedReceiver<Frame> {
        lock(&self.pending).take().unwrap()
    }
}

impl Socket for PhoenixSocket {
    fn endpoint(&self) -> String {
        display_endpoint(&self.endpoint)
    }

    fn connect(&self) -> Result<(), ClientError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let Some(outbound) = lock(&self.pending).take() else {
            tracing::debug!("Socket to {} is already connecting", self.endpoint());
            return Ok(());
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *lock(&self.guard.shutdown) = Some(shutdown_tx);

        runtime.spawn(run_connection(
            self.endpoint.clone(),
            self.heartbeat_interval,
            outbound,
            Arc::clone(&self.shared),
            shutdown_rx,
        ));

        Ok(())
    }

    fn channel(&self, topic: &ChannelTopic, params: Value) -> Arc<dyn Channel> {
        let state = Arc::new(ChannelState::new(
            topic.clone(),
            self.shared.next_ref(),
            params,
        ));

        self.shared.register(&state);

        Arc::new(PhoenixChannel::new(
            state,
            Arc::clone(&self.shared),
            Arc::clone(&self.guard),
        ))
    }
}

/// Own the WebSocket: flush queued frames, send heartbeats and route inbound frames
async fn run_connection(
    endpoint: Url,
    heartbeat_interval: Duration,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    shared: Arc<SocketShared>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let endpoint_display = display_endpoint(&endpoint);

    let (ws_stream, response) = match connect_async(endpoint.as_str()).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", endpoint_display, e);
            outbound.close();
            shared.close_all();
            return;
        }
    };
    tracing::info!("Connected to {} ({})", endpoint_display, response.status());

    let (mut write, mut read) = ws_stream.split();

    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!("Last handle dropped, closing {}", endpoint_display);
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = send_frame(&mut write, &frame).await {
                    tracing::error!(
                        "Failed to send '{}' to {}: {}",
                        frame.event,
                        endpoint_display,
                        e
                    );
                    break;
                }
            }
            _ = heartbeat.tick() => {
                let frame = Frame::heartbeat(shared.next_ref());
                if let Err(e) = send_frame(&mut write, &frame).await {
                    tracing::error!("Failed to send heartbeat to {}: {}", endpoint_display, e);
                    break;
                }
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => shared.route(text.as_str()),
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring binary message ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Server closed connection: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!("WebSocket error on {}: {}", endpoint_display, e);
                    break;
                }
                None => {
                    tracing::info!("Connection to {} ended", endpoint_display);
                    break;
                }
            },
        }
    }

    outbound.close();
    shared.close_all();
}

async fn send_frame<S>(sink: &mut S, frame: &Frame) -> Result<(), tungstenite::Error>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = match frame.encode() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Dropping '{}' on '{}': {}", frame.event, frame.topic, e);
            return Ok(());
        }
    };
    sink.send(Message::Text(text.into())).await
}
