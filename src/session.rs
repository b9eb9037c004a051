//! Session state for one coaching conversation.
//!
//! The phase is a sum type: `Guiding` and `FollowUp` carry their own counters,
//! so a session can never hold guidance and follow-up state at the same time.
//! All mutation goes through the methods below; each refuses to run in a phase
//! that forbids it and reports `CoachError::InvalidTransition`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::Problem;
use crate::error::CoachError;

pub const DEFAULT_MAX_GUIDANCE_ATTEMPTS: u32 = 5;
/// Number of comprehension questions asked after a correct solution.
pub const FOLLOWUP_TARGET: u32 = 3;

/// Escalation level for guidance hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintTier {
  /// Ask about the learner's approach.
  Conceptual = 1,
  /// Point at a specific gap.
  Structural = 2,
  /// Near-complete structural hint, still without the final algorithm.
  NearComplete = 3,
}

impl HintTier {
  pub fn level(self) -> u8 { self as u8 }
}

/// Hint tier for a given number of failed guidance rounds.
/// The first miss already escalates; saturates at `NearComplete` from 3 onward.
pub fn hint_tier(attempts: u32) -> HintTier {
  match attempts {
    0 => HintTier::Conceptual,
    1 | 2 => HintTier::Structural,
    _ => HintTier::NearComplete,
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuidanceState {
  pub attempts: u32,
  pub max_attempts: u32,
}

impl GuidanceState {
  fn new(max_attempts: u32) -> Self {
    Self { attempts: 0, max_attempts }
  }

  pub fn hint_tier(&self) -> HintTier { hint_tier(self.attempts) }

  pub fn is_exhausted(&self) -> bool { self.attempts >= self.max_attempts }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpState {
  /// Questions answered so far.
  pub asked: u32,
  /// Question texts in the order they were put to the learner.
  pub questions: Vec<String>,
}

impl FollowUpState {
  pub fn is_complete(&self) -> bool { self.asked >= FOLLOWUP_TARGET }
}

/// State-machine states. Sub-state lives inside the variant that owns it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPhase {
  NoProblem,
  AwaitingSubmission,
  Guiding(GuidanceState),
  FollowUp(FollowUpState),
  Teaching,
  Done,
}

impl SessionPhase {
  pub fn kind(&self) -> PhaseKind {
    match self {
      SessionPhase::NoProblem => PhaseKind::NoProblem,
      SessionPhase::AwaitingSubmission => PhaseKind::AwaitingSubmission,
      SessionPhase::Guiding(_) => PhaseKind::Guiding,
      SessionPhase::FollowUp(_) => PhaseKind::FollowUp,
      SessionPhase::Teaching => PhaseKind::Teaching,
      SessionPhase::Done => PhaseKind::Done,
    }
  }
}

/// Payload-free phase tag, used for status display and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
  NoProblem,
  AwaitingSubmission,
  Guiding,
  FollowUp,
  Teaching,
  Done,
}

impl PhaseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      PhaseKind::NoProblem => "no_problem",
      PhaseKind::AwaitingSubmission => "awaiting_submission",
      PhaseKind::Guiding => "guiding",
      PhaseKind::FollowUp => "follow_up",
      PhaseKind::Teaching => "teaching",
      PhaseKind::Done => "done",
    }
  }
}

impl fmt::Display for PhaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
  Learner,
  Coach,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Turn {
  pub speaker: Speaker,
  pub text: String,
}

/// Serializable snapshot for UI-side status display.
#[derive(Clone, Debug, Serialize)]
pub struct SessionStatus {
  pub session_id: Uuid,
  pub phase: PhaseKind,
  pub problem: Option<String>,
  pub attempts: Option<u32>,
  pub max_attempts: u32,
  pub hint_tier: Option<u8>,
  pub followup_asked: Option<u32>,
  pub followup_total: u32,
  pub turns: usize,
}

#[derive(Clone, Debug)]
pub struct Session {
  id: Uuid,
  problem: Option<Problem>,
  phase: SessionPhase,
  history: Vec<Turn>,
  /// Index into `history` where the current problem's conversation starts.
  problem_started_at: usize,
  last_submission: Option<String>,
  max_attempts: u32,
}

impl Default for Session {
  fn default() -> Self { Self::new(DEFAULT_MAX_GUIDANCE_ATTEMPTS) }
}

impl Session {
  /// Fresh session in `NoProblem`. `max_attempts` is clamped to at least 1.
  pub fn new(max_attempts: u32) -> Self {
    Self {
      id: Uuid::new_v4(),
      problem: None,
      phase: SessionPhase::NoProblem,
      history: Vec::new(),
      problem_started_at: 0,
      last_submission: None,
      max_attempts: max_attempts.max(1),
    }
  }

  pub fn id(&self) -> Uuid { self.id }
  pub fn problem(&self) -> Option<&Problem> { self.problem.as_ref() }
  pub fn phase(&self) -> &SessionPhase { &self.phase }
  pub fn phase_kind(&self) -> PhaseKind { self.phase.kind() }
  pub fn history(&self) -> &[Turn] { &self.history }
  /// Turns since the current problem was selected.
  pub fn problem_history(&self) -> &[Turn] { &self.history[self.problem_started_at..] }
  pub fn last_submission(&self) -> Option<&str> { self.last_submission.as_deref() }
  pub fn max_attempts(&self) -> u32 { self.max_attempts }

  pub fn guidance(&self) -> Option<&GuidanceState> {
    match &self.phase {
      SessionPhase::Guiding(g) => Some(g),
      _ => None,
    }
  }

  pub fn followup(&self) -> Option<&FollowUpState> {
    match &self.phase {
      SessionPhase::FollowUp(f) => Some(f),
      _ => None,
    }
  }

  fn invalid(&self, operation: &'static str) -> CoachError {
    CoachError::InvalidTransition { operation, phase: self.phase_kind() }
  }

  fn transition(&mut self, next: SessionPhase) {
    debug!(target: "coach", session = %self.id, from = %self.phase_kind(), to = %next.kind(), "Phase transition");
    self.phase = next;
  }

  /// Activate a problem. Allowed from every phase; discards any running loop.
  pub fn select_problem(&mut self, problem: Problem) {
    self.problem = Some(problem);
    self.problem_started_at = self.history.len();
    self.last_submission = None;
    self.transition(SessionPhase::AwaitingSubmission);
  }

  pub fn record_turn(&mut self, speaker: Speaker, text: impl Into<String>) {
    self.history.push(Turn { speaker, text: text.into() });
  }

  /// Remember the learner's latest code. Requires an active problem.
  pub fn record_submission(&mut self, code: impl Into<String>) -> Result<(), CoachError> {
    if self.problem.is_none() {
      return Err(self.invalid("record a submission"));
    }
    self.last_submission = Some(code.into());
    Ok(())
  }

  /// Start a new guidance episode with `attempts = 0`.
  pub fn enter_guidance(&mut self) -> Result<(), CoachError> {
    match self.phase {
      SessionPhase::AwaitingSubmission => {
        self.transition(SessionPhase::Guiding(GuidanceState::new(self.max_attempts)));
        Ok(())
      }
      _ => Err(self.invalid("enter guidance")),
    }
  }

  /// Count one more unsuccessful guidance round; refuses past the cap.
  pub fn record_guidance_attempt(&mut self) -> Result<u32, CoachError> {
    let err = self.invalid("record a guidance attempt");
    match &mut self.phase {
      SessionPhase::Guiding(g) if !g.is_exhausted() => {
        g.attempts += 1;
        Ok(g.attempts)
      }
      _ => Err(err),
    }
  }

  pub fn enter_followup(&mut self) -> Result<(), CoachError> {
    match self.phase {
      SessionPhase::AwaitingSubmission | SessionPhase::Guiding(_) => {
        self.transition(SessionPhase::FollowUp(FollowUpState::default()));
        Ok(())
      }
      _ => Err(self.invalid("enter follow-up")),
    }
  }

  /// Note the text of a follow-up question put to the learner.
  pub fn note_followup_question(&mut self, question: impl Into<String>) -> Result<(), CoachError> {
    let err = self.invalid("note a follow-up question");
    match &mut self.phase {
      SessionPhase::FollowUp(f) => {
        f.questions.push(question.into());
        Ok(())
      }
      _ => Err(err),
    }
  }

  /// Count one answered follow-up; never exceeds `FOLLOWUP_TARGET`.
  pub fn record_followup_asked(&mut self) -> Result<u32, CoachError> {
    let err = self.invalid("record a follow-up answer");
    match &mut self.phase {
      SessionPhase::FollowUp(f) if !f.is_complete() => {
        f.asked += 1;
        Ok(f.asked)
      }
      _ => Err(err),
    }
  }

  /// Guidance budget exhausted; switch to worked teaching.
  pub fn enter_teaching(&mut self) -> Result<(), CoachError> {
    match self.phase {
      SessionPhase::Guiding(_) => {
        self.transition(SessionPhase::Teaching);
        Ok(())
      }
      _ => Err(self.invalid("enter teaching")),
    }
  }

  /// Learner gave up on the problem; the solution is taught right away.
  pub fn skip_problem(&mut self) -> Result<(), CoachError> {
    match self.phase {
      SessionPhase::AwaitingSubmission | SessionPhase::Guiding(_) => {
        self.transition(SessionPhase::Teaching);
        Ok(())
      }
      _ => Err(self.invalid("skip the problem")),
    }
  }

  pub fn finish(&mut self) -> Result<(), CoachError> {
    match self.phase {
      SessionPhase::FollowUp(_) | SessionPhase::Teaching => {
        self.transition(SessionPhase::Done);
        Ok(())
      }
      _ => Err(self.invalid("finish")),
    }
  }

  pub fn status(&self) -> SessionStatus {
    SessionStatus {
      session_id: self.id,
      phase: self.phase_kind(),
      problem: self.problem.as_ref().map(|p| p.title.clone()),
      attempts: self.guidance().map(|g| g.attempts),
      max_attempts: self.max_attempts,
      hint_tier: self.guidance().map(|g| g.hint_tier().level()),
      followup_asked: self.followup().map(|f| f.asked),
      followup_total: FOLLOWUP_TARGET,
      turns: self.history.len(),
    }
  }
}
