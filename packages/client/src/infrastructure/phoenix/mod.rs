//! Phoenix Channels (V2 JSON serializer) over WebSocket.
//!
//! Implements just enough of the protocol for the conversation client:
//! join, leave, push, event routing and heartbeats. There is no
//! reconnection; when the connection drops, pending joins fail and the
//! socket stays closed.

mod channel;
mod endpoint;
mod frame;
mod socket;

pub use channel::PhoenixChannel;
pub use endpoint::{PROTOCOL_VERSION, endpoint_url};
pub use frame::{Frame, Reply, ReplyStatus};
pub use socket::{PhoenixConnector, PhoenixSocket};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a handler panicked while holding it
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
