//! Server-Sent Events stream of wizard events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use rolemine_common::WizardEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Idle interval after which a keep-alive comment is sent
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Named SSE event carrying the JSON form of `event`
fn sse_event(event: &WizardEvent) -> Option<Event> {
    let event_type = event.event_type();
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event_type).data(json)),
        Err(e) => {
            warn!(event_type, error = %e, "SSE: dropping unserializable wizard event");
            None
        }
    }
}

/// GET /wizard/events
///
/// Every wizard event is forwarded under its `event_type` name. A client that falls
/// behind the bus gets a `lagged` comment with the number of skipped events and keeps
/// streaming; the stream ends when the bus closes.
pub async fn wizard_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_bus.subscribe();
    info!("SSE client subscribed to wizard events");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(sse) = sse_event(&event) {
                        debug!(event_type = event.event_type(), "SSE: forwarding wizard event");
                        yield Ok(sse);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "SSE: client lagged behind the event bus");
                    yield Ok(Event::default().comment(format!("lagged {}", skipped)));
                }
                Err(RecvError::Closed) => {
                    debug!("SSE: event bus closed, ending stream");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
