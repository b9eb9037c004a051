//! HTTP endpoint handlers. Read-only views of the problem catalog; the
//! conversation itself runs over the WebSocket.

use std::sync::Arc;
use axum::{extract::{State, Query}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, instrument, warn};

use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state), fields(difficulty = ?q.difficulty))]
pub async fn http_list_problems(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProblemsQuery>,
) -> impl IntoResponse {
  let problems: Vec<ProblemSummary> = match q.difficulty {
    Some(d) => state.catalog.by_difficulty(d).into_iter().map(to_summary).collect(),
    None => state.catalog.list().iter().map(to_summary).collect(),
  };
  info!(target: "interview_coach", count = problems.len(), "HTTP problems listed");
  Json(problems)
}

#[instrument(level = "info", skip(state), fields(title = %q.title))]
pub async fn http_get_problem(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProblemQuery>,
) -> impl IntoResponse {
  match state.catalog.by_title(&q.title) {
    Some(p) => (StatusCode::OK, Json(to_out(p))).into_response(),
    None => {
      warn!(target: "interview_coach", title = %q.title, "HTTP problem not found");
      let error = format!("no problem matches '{}'", q.title);
      (StatusCode::NOT_FOUND, Json(ErrorOut { error })).into_response()
    }
  }
}
