pub mod rehydrate;
pub mod runner;

pub use rehydrate::rehydrate_queue;
pub use runner::{DocumentWorker, WorkerHandle};
