//! Websocket gateway for candidate connections.
//!
//! One socket drives one interview session. The receive loop is strictly
//! sequential: a turn runs to completion, agent calls and persistence
//! included, before the next inbound frame is read. That gives in-order
//! replies for free and means a disconnect can never interrupt an
//! in-flight turn.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::{debug, error, warn};

use shared_types::{ClientEvent, ServerEvent};

use crate::session::ConnectionId;
use crate::state::AppState;

pub async fn interview_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_interview_socket(socket, state))
}

async fn handle_interview_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let conn = ConnectionId::new();
    debug!(connection = %conn, "interview socket connected");

    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(connection = %conn, error = %e, "unparseable client event");
                        let rejection = ServerEvent::Error {
                            message: "Invalid message format".to_string(),
                        };
                        if let SendStatus::Closed = send_event(&mut socket, &rejection).await {
                            break;
                        }
                        continue;
                    }
                };
                let events = dispatch(&state, &conn, event).await;
                if !send_events(&mut socket, &events).await {
                    break;
                }
            }
            Some(Ok(Message::Ping(data))) => {
                let _ = socket.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(connection = %conn, error = %e, "interview websocket receive error");
                break;
            }
        }
    }

    state.controller.disconnect(&conn).await;
    debug!(connection = %conn, "interview socket closed");
}

/// Run one client event through the stage controller. A failed turn
/// collapses to a single error event; events staged before the failure are
/// dropped with it.
async fn dispatch(state: &AppState, conn: &ConnectionId, event: ClientEvent) -> Vec<ServerEvent> {
    let result = match event {
        ClientEvent::StartInterview { invitation_token } => {
            state
                .controller
                .start_interview(conn, &invitation_token)
                .await
        }
        ClientEvent::InterviewResponse { message } => {
            state.controller.interview_response(conn, message).await
        }
        ClientEvent::StartAssessment => state.controller.start_assessment(conn).await,
        ClientEvent::AssessmentResponse { message } => {
            state.controller.assessment_response(conn, message).await
        }
        ClientEvent::SubmitSolution { solution } => {
            state.controller.submit_solution(conn, &solution).await
        }
    };

    match result {
        Ok(events) => events,
        Err(e) => {
            warn!(connection = %conn, "turn failed: {e:?}");
            vec![ServerEvent::Error {
                message: e.to_string(),
            }]
        }
    }
}

async fn send_events(socket: &mut WebSocket, events: &[ServerEvent]) -> bool {
    for event in events {
        if let SendStatus::Closed = send_event(socket, event).await {
            return false;
        }
    }
    true
}

/// Outcome of pushing one event down the socket. A dropped event is a bug
/// on our side, not a transport problem, so the connection stays up.
enum SendStatus {
    Sent,
    Dropped,
    Closed,
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> SendStatus {
    let Some(json) = encode_event(event) else {
        return SendStatus::Dropped;
    };
    if socket.send(Message::Text(json.into())).await.is_ok() {
        SendStatus::Sent
    } else {
        SendStatus::Closed
    }
}

fn encode_event(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            error!(error = %e, "dropping unencodable server event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::CodingAssessment;

    #[test]
    fn test_every_server_event_encodes() {
        let events = [
            ServerEvent::InterviewMessage {
                message: "Welcome!".to_string(),
            },
            ServerEvent::AssessmentMessage {
                message: "Take your time.".to_string(),
            },
            ServerEvent::Assessment {
                assessment: CodingAssessment::default(),
            },
            ServerEvent::AssessmentTransition,
            ServerEvent::InterviewEnd,
            ServerEvent::Error {
                message: "Invalid session".to_string(),
            },
        ];
        for event in &events {
            assert!(encode_event(event).is_some());
        }
    }
}
