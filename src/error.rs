//! Error taxonomy for the coach.
//!
//! `GenerateError` is what a text generator reports. `CoachError` is what the
//! controller and session surface to callers; only a successful turn advances
//! a session, so every `CoachError` implies the session was left untouched.

use crate::session::PhaseKind;

/// Failure of a single text-generation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
  /// The capability answered, but the answer does not fit the requested shape.
  #[error("malformed {shape} output: {detail}")]
  MalformedOutput { shape: &'static str, detail: String },

  /// The capability could not be reached or refused the request.
  #[error("text generation unavailable: {0}")]
  Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
  /// A session mutator was called in a phase that forbids it.
  #[error("invalid transition: cannot {operation} while in phase {phase}")]
  InvalidTransition { operation: &'static str, phase: PhaseKind },

  /// Generation failed and the single stricter retry failed too.
  #[error("generation failed after retry: {0}")]
  Generation(#[source] GenerateError),

  #[error("no problem matches '{0}'")]
  ProblemNotFound(String),
}

impl CoachError {
  /// Stable identifier used by the service surface.
  pub fn kind(&self) -> &'static str {
    match self {
      CoachError::InvalidTransition { .. } => "invalid_transition",
      CoachError::Generation(_) => "generation_error",
      CoachError::ProblemNotFound(_) => "problem_not_found",
    }
  }
}
