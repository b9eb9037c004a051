//! Interview coach: a Socratic session controller for algorithm practice.
//!
//! The core (`session`, `prompts`, `coach`) depends only on the
//! [`llm::TextGenerator`] capability; `openai` and `offline` provide
//! implementations, and `routes` exposes the coach over HTTP + WebSocket.

pub mod catalog;
pub mod coach;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod offline;
pub mod openai;
pub mod prompts;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;

pub use catalog::{ProblemCatalog, ProblemChoice};
pub use coach::{Coach, CoachReply, Intent, Verdict};
pub use domain::{Difficulty, Problem, TestCase};
pub use error::{CoachError, GenerateError};
pub use llm::{OutputShape, ParsedResult, TextGenerator};
pub use session::{hint_tier, HintTier, PhaseKind, Session, SessionPhase, SessionStatus};
