use crate::db::{document_repo, Database, DatabaseError};
use crate::document::DocumentStatus;
use crate::queue::AdmissionQueue;

/// Replays every durably pending document into `queue`, oldest first.
///
/// Returns how many ids were actually added. Ids already queued are not
/// counted. Records stranded in `processing` or `analyzing` are left alone.
pub fn rehydrate_queue(db: &Database, queue: &AdmissionQueue) -> Result<usize, DatabaseError> {
    let ids = document_repo::find_ids_by_status_oldest_first(db, DocumentStatus::INITIAL)?;

    let added = ids.iter().filter(|id| queue.enqueue(id)).count();

    log::info!(
        "Rehydrated {} pending document(s) into the admission queue ({} found)",
        added,
        ids.len()
    );
    Ok(added)
}
