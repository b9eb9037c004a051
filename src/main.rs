//! Interview Coach · algorithm practice backend
//!
//! - Axum HTTP + WebSocket API (one coaching session per WebSocket connection)
//! - Optional OpenAI integration (via environment variables); offline coach otherwise
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   OPENAI_API_KEY      : enables OpenAI integration if present
//!   OPENAI_BASE_URL     : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL   : default "gpt-4o-mini" (intent classification)
//!   OPENAI_STRONG_MODEL : default "gpt-4o" (evaluation, hints, follow-ups, teaching)
//!   OPENAI_TIMEOUT_SECS : default 60
//!   OPENAI_MAX_TOKENS   : default 1500
//!   COACH_CONFIG_PATH   : path to TOML config (coaching limits, prompts, extra problems)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use interview_coach::routes::build_router;
use interview_coach::state::AppState;
use interview_coach::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::from_env());
  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "interview_coach", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "interview_coach", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "interview_coach", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
