use std::sync::Arc;

use crate::broadcast::StatusBroadcaster;
use crate::intake::Intake;
use crate::queue::AdmissionQueue;

/// Process-scoped handles shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<Intake>,
    pub queue: Arc<AdmissionQueue>,
    pub broadcaster: StatusBroadcaster,
}

impl AppState {
    pub fn new(intake: Arc<Intake>, queue: Arc<AdmissionQueue>, broadcaster: StatusBroadcaster) -> Self {
        Self {
            intake,
            queue,
            broadcaster,
        }
    }
}
