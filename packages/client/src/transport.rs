//! Transport seam between the conversation client and the socket library.
//!
//! The client only depends on these traits. The Phoenix WebSocket
//! implementation lives in `infrastructure::phoenix`; tests substitute mocks.

use std::{collections::BTreeMap, sync::Arc};

use serde_json::Value;
use tokio::sync::watch;

use crate::{domain::ChannelTopic, error::ClientError};

/// Connection parameters sent with the socket handshake (e.g. `token`)
pub type SocketParams = BTreeMap<String, String>;

/// Listener invoked with the payload of every matching inbound event
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Creates sockets bound to an endpoint
#[cfg_attr(test, mockall::automock)]
pub trait SocketConnector: Send + Sync {
    /// Build a socket for `base_url`. The socket is not connected yet.
    fn socket(&self, base_url: &str, params: &SocketParams)
    -> Result<Arc<dyn Socket>, ClientError>;
}

/// A transport connection multiplexing channels
#[cfg_attr(test, mockall::automock)]
pub trait Socket: Send + Sync {
    /// Endpoint the socket connects to, without connection parameters
    fn endpoint(&self) -> String;

    /// Start connecting in the background. Returns without waiting for the
    /// connection to be established.
    fn connect(&self) -> Result<(), ClientError>;

    /// Create a channel for `topic` on this socket
    fn channel(&self, topic: &ChannelTopic, params: Value) -> Arc<dyn Channel>;
}

/// A named sub-stream of a socket
#[cfg_attr(test, mockall::automock)]
pub trait Channel: Send + Sync {
    fn topic(&self) -> ChannelTopic;

    /// Send the join request. The receipt resolves once the server replies.
    fn join(&self) -> JoinReceipt;

    /// Register a listener for inbound `event`
    fn on(&self, event: &str, handler: EventHandler);

    /// Queue an outbound `event`. No acknowledgment is awaited.
    fn push(&self, event: &str, payload: Value) -> Result<(), ClientError>;

    /// Send the leave request and stop routing events to this channel
    fn leave(&self);
}

/// Result of a join request
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// The server replied `ok` with this response
    Joined(Value),
    /// The server replied `error` with this response
    Rejected(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum JoinStatus {
    Pending,
    Resolved(JoinOutcome),
    Closed,
}

/// Future-like handle on the outcome of a join request
///
/// Receipts are cheap to clone; every clone observes the same outcome.
#[derive(Debug, Clone)]
pub struct JoinReceipt {
    status: watch::Receiver<JoinStatus>,
}

impl JoinReceipt {
    /// Create a pending receipt together with the resolver that completes it
    pub fn pending() -> (JoinResolver, Self) {
        let (tx, rx) = watch::channel(JoinStatus::Pending);
        (JoinResolver { status: tx }, Self { status: rx })
    }

    /// Create a receipt that is already resolved
    pub fn resolved(outcome: JoinOutcome) -> Self {
        let (_tx, rx) = watch::channel(JoinStatus::Resolved(outcome));
        Self { status: rx }
    }

    /// Outcome if the server already replied
    pub fn try_outcome(&self) -> Option<JoinOutcome> {
        match &*self.status.borrow() {
            JoinStatus::Resolved(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Wait for the server's reply.
    ///
    /// Fails with [`ClientError::ConnectionClosed`] if the connection or the
    /// channel goes away before a reply arrives.
    pub async fn outcome(mut self) -> Result<JoinOutcome, ClientError> {
        let status = self
            .status
            .wait_for(|status| !matches!(status, JoinStatus::Pending))
            .await
            .map_err(|_| ClientError::ConnectionClosed)?;

        match &*status {
            JoinStatus::Resolved(outcome) => Ok(outcome.clone()),
            JoinStatus::Pending | JoinStatus::Closed => Err(ClientError::ConnectionClosed),
        }
    }
}

/// Completes a [`JoinReceipt`]. Only the first resolution takes effect.
#[derive(Debug)]
pub struct JoinResolver {
    status: watch::Sender<JoinStatus>,
}

impl JoinResolver {
    pub fn resolve(&self, outcome: JoinOutcome) {
        self.status.send_if_modified(|status| {
            if matches!(status, JoinStatus::Pending) {
                *status = JoinStatus::Resolved(outcome);
                true
            } else {
                false
            }
        });
    }

    /// Mark the join as abandoned if no reply arrived yet
    pub fn close(&self) {
        self.status.send_if_modified(|status| {
            if matches!(status, JoinStatus::Pending) {
                *status = JoinStatus::Closed;
                true
            } else {
                false
            }
        });
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.status.borrow(), JoinStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_receipt_resolves_with_joined() {
        // テスト項目: resolve された Joined がすべてのクローンから観測できる
        // given (前提条件):
        let (resolver, receipt) = JoinReceipt::pending();
        let other = receipt.clone();

        // when (操作):
        resolver.resolve(JoinOutcome::Joined(json!({ "history": [] })));

        // then (期待する結果):
        assert_eq!(
            receipt.outcome().await.unwrap(),
            JoinOutcome::Joined(json!({ "history": [] }))
        );
        assert_eq!(
            other.try_outcome(),
            Some(JoinOutcome::Joined(json!({ "history": [] })))
        );
    }

    #[tokio::test]
    async fn test_first_resolution_wins() {
        // テスト項目: 2 回目以降の resolve は無視される
        // given (前提条件):
        let (resolver, receipt) = JoinReceipt::pending();

        // when (操作):
        resolver.resolve(JoinOutcome::Rejected(json!({ "reason": "unauthorized" })));
        resolver.resolve(JoinOutcome::Joined(json!({})));
        resolver.close();

        // then (期待する結果):
        assert_eq!(
            receipt.outcome().await.unwrap(),
            JoinOutcome::Rejected(json!({ "reason": "unauthorized" }))
        );
        assert!(!resolver.is_pending());
    }

    #[tokio::test]
    async fn test_closed_receipt_fails() {
        // テスト項目: 応答前に close されると ConnectionClosed で失敗する
        // given (前提条件):
        let (resolver, receipt) = JoinReceipt::pending();

        // when (操作):
        resolver.close();

        // then (期待する結果):
        assert!(matches!(
            receipt.outcome().await,
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_dropped_resolver_fails_pending_receipt() {
        // テスト項目: resolver が破棄されると保留中の receipt は ConnectionClosed になる
        // given (前提条件):
        let (resolver, receipt) = JoinReceipt::pending();

        // when (操作):
        drop(resolver);

        // then (期待する結果):
        assert!(matches!(
            receipt.outcome().await,
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_resolved_receipt_is_ready() {
        // テスト項目: resolved() で作った receipt は即座に結果を返す
        // when (操作):
        let receipt = JoinReceipt::resolved(JoinOutcome::Joined(json!({})));

        // then (期待する結果):
        assert_eq!(receipt.try_outcome(), Some(JoinOutcome::Joined(json!({}))));
        assert_eq!(
            receipt.outcome().await.unwrap(),
            JoinOutcome::Joined(json!({}))
        );
    }

    #[test]
    fn test_pending_receipt_has_no_outcome() {
        // テスト項目: 保留中の receipt は try_outcome で None を返す
        // given (前提条件):
        let (resolver, receipt) = JoinReceipt::pending();

        // then (期待する結果):
        assert!(receipt.try_outcome().is_none());
        assert!(resolver.is_pending());
    }
}
