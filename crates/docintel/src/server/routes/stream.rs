use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};

use crate::broadcast::Subscription;
use crate::server::AppState;

/// Streams every status event as `event: status` until the client leaves.
///
/// The subscription lives inside the stream, so a disconnect drops it and
/// deregisters the mailbox.
pub async fn stream_documents(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broadcaster.subscribe();
    log::info!("Stream client connected (subscriber {})", subscription.id());

    Sse::new(events(subscription)).keep_alive(KeepAlive::default())
}

fn events(subscription: Subscription) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(subscription, |mut subscription| async move {
        loop {
            let status_event = subscription.recv().await?;
            match Event::default().event("status").json_data(&status_event) {
                Ok(event) => return Some((Ok(event), subscription)),
                Err(e) => log::warn!(
                    "Dropping unserializable event for {}: {}",
                    status_event.document_id,
                    e
                ),
            }
        }
    })
}
