//! WebSocket upgrade + message loop. Each connection owns exactly one coaching
//! session; messages are handled one at a time, so turns never overlap.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug, warn};

use crate::protocol::{choice_from, to_summary, ClientWsMessage, ServerWsMessage};
use crate::session::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "interview_coach", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut session = state.coach.start_session();
  info!(target: "interview_coach", session = %session.id(), "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "interview_coach", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::error("invalid_message", format!("Invalid JSON: {}", e)),
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "kind": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "interview_coach", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "interview_coach", session = %session.id(), phase = %session.phase_kind(), turns = session.history().len(), "WebSocket disconnected");
}

/// Dispatch one client message against this connection's session.
#[instrument(level = "info", skip(state, session), fields(session = %session.id()))]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut Session) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListProblems { difficulty } => {
      let problems = match difficulty {
        Some(d) => state.catalog.by_difficulty(d).into_iter().map(to_summary).collect(),
        None => state.catalog.list().iter().map(to_summary).collect(),
      };
      ServerWsMessage::Problems { problems }
    }

    ClientWsMessage::SelectProblem { title, difficulty } => {
      match state.coach.select_problem(session, &choice_from(title, difficulty)) {
        Ok(reply) => ServerWsMessage::CoachReply { text: reply.text, phase: reply.phase },
        Err(e) => ServerWsMessage::error(e.kind(), e.to_string()),
      }
    }

    ClientWsMessage::Message { text } => match state.coach.handle_turn(session, &text).await {
      Ok(reply) => ServerWsMessage::CoachReply { text: reply.text, phase: reply.phase },
      Err(e) => {
        warn!(target: "interview_coach", kind = e.kind(), error = %e, "Turn failed; session unchanged");
        ServerWsMessage::error(e.kind(), e.to_string())
      }
    },

    ClientWsMessage::Status => ServerWsMessage::Status { status: session.status() },

    ClientWsMessage::Reset => {
      *session = state.coach.start_session();
      ServerWsMessage::Status { status: session.status() }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::session::PhaseKind;

  #[tokio::test]
  async fn a_connection_drives_its_own_session() {
    let state = AppState::offline();
    let mut session = state.coach.start_session();

    let reply = handle_client_ws(ClientWsMessage::Message { text: "hi".into() }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::CoachReply { phase: PhaseKind::NoProblem, .. }));

    let reply = handle_client_ws(
      ClientWsMessage::SelectProblem { title: Some("两数之和".into()), difficulty: None },
      &state,
      &mut session,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::CoachReply { phase: PhaseKind::AwaitingSubmission, .. }));

    let reply = handle_client_ws(ClientWsMessage::Message { text: "给我一点提示".into() }, &state, &mut session).await;
    assert!(matches!(reply, ServerWsMessage::CoachReply { phase: PhaseKind::Guiding, .. }));

    let reply = handle_client_ws(ClientWsMessage::Status, &state, &mut session).await;
    match reply {
      ServerWsMessage::Status { status } => {
        assert_eq!(status.phase, PhaseKind::Guiding);
        assert_eq!(status.attempts, Some(0));
      }
      other => panic!("unexpected {:?}", other),
    }

    let id = session.id();
    handle_client_ws(ClientWsMessage::Reset, &state, &mut session).await;
    assert_ne!(session.id(), id);
    assert_eq!(session.phase_kind(), PhaseKind::NoProblem);
  }

  #[tokio::test]
  async fn unknown_problem_is_reported_by_kind() {
    let state = AppState::offline();
    let mut session = state.coach.start_session();
    let reply = handle_client_ws(
      ClientWsMessage::SelectProblem { title: Some("no such problem".into()), difficulty: None },
      &state,
      &mut session,
    )
    .await;
    assert!(matches!(reply, ServerWsMessage::Error { ref kind, .. } if kind == "problem_not_found"));
    assert_eq!(session.phase_kind(), PhaseKind::NoProblem);
  }
}
