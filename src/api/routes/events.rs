//! Server-sent event stream of engine notifications.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{stream, Stream};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::engine::Engine;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new().route("/", get(subscribe)).with_state(engine)
}

/// GET /events - Highlight, reload and session notifications as SSE.
///
/// Each event is named after its kind (`meeting_synced`, `reload_required`,
/// ...) and carries the event as JSON. A client that falls behind is sent a
/// `reload_required` without a meeting, since it missed state changes.
async fn subscribe(
    State(engine): State<Arc<Engine>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    debug!("Event stream subscriber connected");

    let events = stream::unfold(engine.subscribe(), |mut rx| async move {
        let event = match rx.recv().await {
            Ok(event) => Event::default().event(event.name()).json_data(&event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event stream subscriber lagged, {} event(s) dropped", skipped);
                Ok(Event::default().event("reload_required").data("{}"))
            }
            Err(RecvError::Closed) => return None,
        };
        Some((event, rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
