//! Change-event fan-out to live sessions.
//!
//! Every session owns a bounded outbox. Publishing snapshots the session
//! set, then offers the event to each outbox except the actor's without
//! waiting. A full outbox drops the event for that session only. A closed
//! one is skipped. The rest still get the event.
//!
//! Each outbox is drained by its owner (the server's per-connection writer),
//! so a slow consumer never stalls the publisher or its peers, and never
//! holds more than the configured number of events.

use std::sync::Arc;

use sharedvfs_types::ChangeEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::session::SessionManager;

/// Sending half of a session's notification outbox.
pub(crate) type Outbox = mpsc::Sender<ChangeEvent>;

/// Create a fresh outbox holding at most `capacity` events (at least one).
pub(crate) fn outbox(capacity: usize) -> (Outbox, Subscription) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, Subscription { rx })
}

/// Receiving half of a session's notification outbox.
///
/// Events arrive in the order they were published. The stream ends once the
/// session is disconnected or invalidated.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

/// Delivers change events to every session except the actor's.
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    sessions: Arc<SessionManager>,
}

impl NotificationBroadcaster {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Publish an event. Returns how many sessions it was queued for.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut delivered = 0;
        for (user_name, outbox) in self.sessions.outboxes_except(&event.user_name) {
            match outbox.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    tracing::debug!(
                        to = %user_name,
                        from = %event.user_name,
                        command = %event.command_line,
                        "notification queued"
                    );
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        to = %user_name,
                        from = %event.user_name,
                        command = %event.command_line,
                        "notification outbox full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(to = %user_name, "notification outbox closed, skipping");
                }
            }
        }
        delivered
    }
}
