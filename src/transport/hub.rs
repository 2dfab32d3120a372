//! In-process table of live WebSocket sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Transport;
use crate::domain::ConnectionId;
use crate::error::SendError;

/// Outbound queue of one session, drained by its socket task.
pub type SessionReceiver = mpsc::UnboundedReceiver<String>;

/// Registry of sessions accepted by this process.
///
/// Each session owns an unbounded queue, so [`Transport::send`] never waits
/// on a slow socket.
///
/// Ids handed out by [`ConnectionHub::issue`] carry this hub's instance tag.
/// A send to a tagged id without an entry, or whose socket task has dropped
/// its receiver, is [`SendError::RecipientGone`]. A missing id without the
/// tag may belong to another gateway sharing the registry and is reported
/// as [`SendError::DeliveryFailed`], so it is never pruned from here.
#[derive(Debug)]
pub struct ConnectionHub {
    instance: String,
    sessions: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self {
            instance: uuid::Uuid::new_v4().simple().to_string(),
            sessions: RwLock::default(),
        }
    }
}

impl ConnectionHub {
    /// Creates an empty hub with a fresh instance tag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag prefixed to every id this hub issues.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Assigns an id for a new session accepted by this hub.
    #[must_use]
    pub fn issue(&self) -> ConnectionId {
        ConnectionId::from(format!("{}.{}", self.instance, ConnectionId::generate()))
    }

    /// Returns `true` if `id` was issued by this hub.
    #[must_use]
    pub fn owns(&self, id: &ConnectionId) -> bool {
        id.as_str()
            .strip_prefix(self.instance.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Opens a session queue for `id`, replacing any previous one.
    pub fn register(&self, id: ConnectionId) -> SessionReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(id, tx);
        }
        rx
    }

    /// Drops the session queue for `id`, if any.
    pub fn unregister(&self, id: &ConnectionId) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(id);
        }
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Returns `true` if no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn deliver(&self, id: &ConnectionId, payload: &str) -> Result<(), SendError> {
        let sent = {
            let sessions = self
                .sessions
                .read()
                .map_err(|e| SendError::DeliveryFailed(e.to_string()))?;
            let Some(tx) = sessions.get(id) else {
                return Err(if self.owns(id) {
                    SendError::RecipientGone
                } else {
                    SendError::DeliveryFailed(format!(
                        "session {id} is not held by this gateway"
                    ))
                });
            };
            tx.send(payload.to_string())
        };
        if sent.is_err() {
            // The socket task is gone without unregistering (upgrade never
            // completed); drop the dead queue.
            self.unregister(id);
            return Err(SendError::RecipientGone);
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for ConnectionHub {
    async fn send(&self, id: &ConnectionId, payload: &str) -> Result<(), SendError> {
        self.deliver(id, payload)
    }
}
