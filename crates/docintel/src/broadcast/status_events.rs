//! Status event broadcaster backed by one unbounded mailbox per subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::analysis::AnalysisResult;
use crate::document::{DocumentRecord, DocumentStatus};

/// One status change of one document. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEvent {
    pub document_id: String,
    pub status: DocumentStatus,
    pub timestamp: DateTime<Utc>,
    pub filename: String,
    /// Set on `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<AnalysisResult>,
    /// Set on `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StatusEvent {
    /// Describes the record's latest transition.
    pub fn from_record(record: &DocumentRecord) -> Self {
        let timestamp = record
            .status_history
            .last()
            .map(|entry| entry.timestamp)
            .unwrap_or(record.updated_at);

        let analysis_result = match record.current_status {
            DocumentStatus::Completed => record.analysis_result.clone(),
            _ => None,
        };
        let error_message = match record.current_status {
            DocumentStatus::Failed => record.error_message.clone(),
            _ => None,
        };

        Self {
            document_id: record.id.clone(),
            status: record.current_status,
            timestamp,
            filename: record.filename.clone(),
            analysis_result,
            error_message,
        }
    }
}

struct Registry {
    next_id: AtomicU64,
    mailboxes: Mutex<HashMap<u64, mpsc::UnboundedSender<StatusEvent>>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<StatusEvent>>> {
        match self.mailboxes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Subscriber registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }
}

/// Broadcasts status events to every registered subscriber.
///
/// Cloning is cheap and all clones share one registry.
#[derive(Clone)]
pub struct StatusBroadcaster {
    registry: Arc<Registry>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                mailboxes: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Registers a new mailbox. Dropping the returned subscription
    /// deregisters it.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().insert(id, sender);
        log::debug!("Subscriber {} registered", id);

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deregisters `subscription`. Equivalent to dropping it.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Delivers a copy of `event` to every mailbox without waiting.
    ///
    /// Mailboxes whose receiver is gone are removed. Returns the number of
    /// deliveries.
    pub fn publish(&self, event: &StatusEvent) -> usize {
        let mut mailboxes = self.registry.lock();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, sender) in mailboxes.iter() {
            match sender.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(*id),
            }
        }

        for id in closed {
            mailboxes.remove(&id);
            log::debug!("Subscriber {} disconnected, removed", id);
        }

        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered mailbox.
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<StatusEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next event. Returns `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.receiver.recv().await
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<StatusEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            log::debug!("Subscriber {} deregistered", self.id);
        }
    }
}
