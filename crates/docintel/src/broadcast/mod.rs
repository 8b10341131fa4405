//! Fan-out of document status changes to live subscribers.

pub mod status_events;

pub use status_events::{StatusBroadcaster, StatusEvent, Subscription};
