//! In-memory FIFO of document ids awaiting the worker.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct QueueState {
    order: VecDeque<String>,
    members: HashSet<String>,
}

/// FIFO set of pending document ids.
///
/// An id is present at most once. Order and membership are updated under one
/// lock, and the lock is never held across an `.await`.
#[derive(Default)]
pub struct AdmissionQueue {
    state: Mutex<QueueState>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Admission queue lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Appends `id` unless it is already queued. Returns whether it was added.
    pub fn enqueue(&self, id: &str) -> bool {
        let mut state = self.lock();
        if !state.members.insert(id.to_string()) {
            return false;
        }
        state.order.push_back(id.to_string());
        true
    }

    /// Removes and returns the oldest id, or `None` when empty.
    pub fn dequeue(&self) -> Option<String> {
        let mut state = self.lock();
        let id = state.order.pop_front()?;
        state.members.remove(&id);
        Some(id)
    }

    pub fn size(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().members.contains(id)
    }

    /// Queued ids in dequeue order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }
}
