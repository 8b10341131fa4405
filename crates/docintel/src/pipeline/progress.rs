use crate::broadcast::{StatusBroadcaster, StatusEvent};

/// Receives one event per persisted status transition.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: StatusEvent) {}
}

/// Bridges pipeline transitions to live subscribers.
pub struct BroadcastProgress {
    broadcaster: StatusBroadcaster,
}

impl BroadcastProgress {
    pub fn new(broadcaster: StatusBroadcaster) -> Self {
        Self { broadcaster }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: StatusEvent) {
        let delivered = self.broadcaster.publish(&event);
        tracing::debug!(
            status = %event.status,
            subscribers = delivered,
            "Published status event"
        );
    }
}
