//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is the **fan-out layer** between a pool's worker thread and whoever
//! wants to observe outcomes:
//!
//! ```text
//! worker thread ── batch resolved ──▶ EventBus::publish (in batch order) ──▶ Subscription
//!                                                                          ├─ test harness
//!                                                                          ├─ demo printer
//!                                                                          └─ ...
//! ```
//!
//! - **Transport-agnostic**: the in-memory implementation uses `std::sync::mpsc`
//! - **Broadcast**: each subscription gets a copy of every published message
//! - **Ordered per publisher**: a single publisher's messages arrive in publish order
//! - **No persistence**: a subscription only sees messages published after it was created

use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// A subscription to an event stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let outcomes = pool.subscribe();
///
/// loop {
///     match outcomes.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => handle(event),
///         Err(RecvTimeoutError::Timeout) => continue,
///         Err(RecvTimeoutError::Disconnected) => break, // pool dropped
///     }
/// }
/// ```
///
/// Subscriptions are meant for a single consuming thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything that is already buffered, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic pub/sub abstraction.
///
/// The trait requires `Send + Sync`: the pool publishes from its worker thread
/// while subscriptions may be created from any thread.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}
