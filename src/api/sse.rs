//! Server-Sent Events (SSE) streaming of dashboard panels.
//!
//! Every connection first receives a snapshot of the current panel board,
//! then a live relay of the broadcast channel the refresh coordinator and
//! the mutating handlers publish to.

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::state::{AppState, DeckEvent};

fn event_name(event: &DeckEvent) -> &'static str {
    match event {
        DeckEvent::Sentiment(_) => "sentiment",
        DeckEvent::Rankings(_) => "rankings",
        DeckEvent::Sectors(_) => "sectors",
        DeckEvent::Charts(_) => "charts",
        DeckEvent::RiskScatter(_) => "risk_scatter",
        DeckEvent::Refresh { .. } => "refresh",
        DeckEvent::LastUpdate(_) => "last_update",
        DeckEvent::Control { .. } => "control",
    }
}

/// Create an SSE stream for a client connection.
pub fn create_sse_stream(
    state: Arc<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.subscribe();

    let stream = stream! {
        // Send the current board contents on connection so a fresh client
        // does not wait a full refresh cycle for its first paint.
        let snapshot: Vec<DeckEvent> = {
            let board = &state.panels;
            let mut events = vec![
                DeckEvent::Sentiment(board.sentiment.read().await.clone()),
                DeckEvent::Rankings(board.rankings.read().await.clone()),
                DeckEvent::Sectors(board.sectors.read().await.clone()),
                DeckEvent::Charts(board.charts.read().await.clone()),
                DeckEvent::RiskScatter(board.scatter.read().await.clone()),
                DeckEvent::Refresh { busy: board.is_busy() },
            ];
            if let Some(version) = board.last_update().await {
                events.push(DeckEvent::LastUpdate(version));
            }
            events
        };

        for event in snapshot {
            if let Ok(json) = serde_json::to_string(&event) {
                yield Ok(Event::default().event(event_name(&event)).data(json));
            }
        }

        // Stream events from the broadcast channel
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        debug!("SSE sending event: {}", event_name(&event));
                        yield Ok(Event::default().event(event_name(&event)).data(json));
                    }
                    Err(e) => {
                        warn!("Failed to serialize SSE event: {}", e);
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("SSE client lagged by {} messages", n);
                    // Continue receiving
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    debug!("SSE broadcast channel closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataVersion;

    #[test]
    fn test_event_names_match_serialized_tag() {
        let event = DeckEvent::Refresh { busy: true };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], event_name(&event));

        let event = DeckEvent::LastUpdate(DataVersion {
            version: 3,
            timestamp: "09:15:00".to_string(),
        });
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], "last_update");
        assert_eq!(json["data"]["version"], 3);
    }
}
