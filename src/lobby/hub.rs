//! Per-session outbound queues

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::game::SessionId;
use crate::net::protocol::ServerMsg;

/// Receiving end of a session's outbox
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<ServerMsg>,
    change_pending: Arc<AtomicBool>,
}

impl Inbox {
    /// Wait for the next message, `None` once the outbox is dropped and drained
    pub async fn recv(&mut self) -> Option<ServerMsg> {
        let msg = self.rx.recv().await?;
        self.dequeued(&msg);
        Some(msg)
    }

    pub fn try_recv(&mut self) -> Result<ServerMsg, mpsc::error::TryRecvError> {
        let msg = self.rx.try_recv()?;
        self.dequeued(&msg);
        Ok(msg)
    }

    fn dequeued(&self, msg: &ServerMsg) {
        if *msg == ServerMsg::Change {
            self.change_pending.store(false, Ordering::Release);
        }
    }
}

struct Outbox {
    tx: mpsc::UnboundedSender<ServerMsg>,
    change_pending: Arc<AtomicBool>,
}

/// Routes server messages to connected sessions. Each session owns one
/// queue; a writer task drains it onto the socket.
///
/// At most one `CHANGE` is queued per session: a LOOK sent after reading it
/// already reflects every change made before it was dequeued, so a client
/// that stops reading does not grow its queue without bound.
#[derive(Default)]
pub struct Hub {
    outboxes: DashMap<SessionId, Outbox>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the outbox for a session
    pub fn register(&self, id: SessionId) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let change_pending = Arc::new(AtomicBool::new(false));
        self.outboxes.insert(
            id,
            Outbox {
                tx,
                change_pending: change_pending.clone(),
            },
        );
        Inbox { rx, change_pending }
    }

    /// Drop the outbox; the session's writer ends once the queue drains
    pub fn unregister(&self, id: SessionId) {
        self.outboxes.remove(&id);
    }

    /// Queue a message, returns false if the session is gone
    pub fn send(&self, id: SessionId, msg: ServerMsg) -> bool {
        let Some(outbox) = self.outboxes.get(&id) else {
            debug!(session_id = %id, "Dropping message for unknown session");
            return false;
        };
        if msg == ServerMsg::Change && outbox.change_pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        outbox.tx.send(msg).is_ok()
    }
}
