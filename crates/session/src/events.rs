//! Session change notifications.
//!
//! Consumers subscribe and re-read [`SessionStore::current`] when something
//! arrives; events carry ids only, never tokens.
//!
//! [`SessionStore::current`]: crate::SessionStore::current

use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use vendorhub_core::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Every cache domain was flushed.
    CachesInvalidated { domains: usize },
    /// `user_id` became the acting identity.
    Activated { user_id: UserId },
    /// No identity is acting any more.
    Deactivated { user_id: Option<UserId> },
    AccountRemoved { user_id: UserId },
    StatsPatched { user_id: UserId },
    ProfileRefreshed { user_id: UserId },
}

/// Receiving end of a session event stream.
#[derive(Debug)]
pub struct Subscription {
    receiver: Receiver<SessionEvent>,
}

impl Subscription {
    /// Block until the next event is available.
    pub fn recv(&self) -> Result<SessionEvent, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Result<SessionEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything published so far that has not been received yet.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.receiver.try_iter().collect()
    }
}

/// In-process broadcast of [`SessionEvent`]s.
///
/// - No IO / no async
/// - Every subscriber gets every event, in publish order
/// - Subscribers that hung up are dropped on the next publish
#[derive(Debug, Default)]
pub struct SessionEvents {
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: SessionEvent) {
        match self.subscribers.lock() {
            Ok(mut subs) => subs.retain(|tx| tx.send(event.clone()).is_ok()),
            Err(_) => tracing::error!("session event bus poisoned; event dropped"),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel();

        // A poisoned bus still hands out a subscription; it just never fires.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        Subscription { receiver }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Disconnect every subscriber.
    pub fn close(&self) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.clear();
        }
    }
}
