//! Prompt construction. Each builder is a pure function of the session snapshot
//! and the learner's text; it returns the system/user texts plus the output
//! shape the controller must request.
//!
//! Every builder except `build_teaching_prompt` appends `NO_SOLUTION_RULE` to
//! the system prompt. Templates come from config and can be overridden; the
//! rule cannot.

use crate::config::Prompts;
use crate::llm::OutputShape;
use crate::session::{HintTier, Session, Speaker, Turn, FOLLOWUP_TARGET};
use crate::util::{fill_template, truncate_chars};

pub const NO_SOLUTION_RULE: &str = "NEVER reveal the solution. Do not write code that solves the problem (not even partially), do not state the final algorithm, do not list the solution steps, and never say \"the answer is ...\". You may confirm what is right, ask guiding questions, point at a direction, and use analogies.";

pub const TEACHING_PERMISSION: &str = "This is the teaching step: you MAY reveal the full solution, including a complete reference implementation.";

const STRICT_JSON_RETRY: &str = "IMPORTANT: your previous reply could not be parsed. Reply with ONE JSON object and nothing else: no prose, no markdown fences, no comments. Use exactly this form:";

const STRICT_TEXT_RETRY: &str = "IMPORTANT: your previous reply was empty or unusable. Reply with plain text only, and make sure the reply is not empty.";

/// Turn texts longer than this are cut when quoted back to the model.
const HISTORY_TURN_CHARS: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
  Intent,
  Evaluation,
  Guidance,
  FollowUp,
  Teaching,
  Answer,
}

impl PromptKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      PromptKind::Intent => "intent",
      PromptKind::Evaluation => "evaluation",
      PromptKind::Guidance => "guidance",
      PromptKind::FollowUp => "followup",
      PromptKind::Teaching => "teaching",
      PromptKind::Answer => "answer",
    }
  }
}

/// One request for the text generator. `shape == None` means free text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRequest {
  pub kind: PromptKind,
  pub system: String,
  pub user: String,
  pub shape: Option<OutputShape>,
}

impl PromptRequest {
  /// Same request with a stricter formatting instruction, used for the single retry.
  pub fn stricter(&self) -> Self {
    let suffix = match &self.shape {
      Some(shape) => format!("{}\n{}", STRICT_JSON_RETRY, shape.describe()),
      None => STRICT_TEXT_RETRY.to_string(),
    };
    Self {
      kind: self.kind,
      system: self.system.clone(),
      user: format!("{}\n\n{}", self.user, suffix),
      shape: self.shape,
    }
  }

  #[cfg(test)]
  pub fn reveals_solution(&self) -> bool {
    !self.system.contains(NO_SOLUTION_RULE)
  }
}

#[derive(Clone, Debug)]
pub struct PromptBuilder {
  prompts: Prompts,
  history_window: usize,
}

impl Default for PromptBuilder {
  fn default() -> Self { Self::new(Prompts::default(), 10) }
}

impl PromptBuilder {
  pub fn new(prompts: Prompts, history_window: usize) -> Self {
    Self { prompts, history_window }
  }

  fn guarded_system(&self) -> String {
    format!("{}\n\n{}", self.prompts.persona_system, NO_SOLUTION_RULE)
  }

  fn structured(&self, kind: PromptKind, body: String, shape: OutputShape) -> PromptRequest {
    PromptRequest {
      kind,
      system: self.guarded_system(),
      user: format!("{}\n\nRespond ONLY with a JSON object of this form:\n{}", body, shape.describe()),
      shape: Some(shape),
    }
  }

  fn tier_instruction(&self, tier: HintTier) -> &str {
    match tier {
      HintTier::Conceptual => &self.prompts.tier1_instruction,
      HintTier::Structural => &self.prompts.tier2_instruction,
      HintTier::NearComplete => &self.prompts.tier3_instruction,
    }
  }

  pub fn build_intent_prompt(&self, session: &Session, input: &str) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let history = format_history(session.problem_history(), self.history_window);
    let body = fill_template(
      &self.prompts.intent_template,
      &[
        ("phase", session.phase_kind().as_str()),
        ("problem", ctx.title.as_str()),
        ("history", history.as_str()),
        ("input", input),
      ],
    );
    self.structured(PromptKind::Intent, body, OutputShape::INTENT)
  }

  pub fn build_evaluation_prompt(&self, session: &Session, submission: &str) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let previous = session
      .last_submission()
      .filter(|prev| *prev != submission)
      .unwrap_or("(none)");
    let body = fill_template(
      &self.prompts.evaluation_template,
      &[
        ("problem", ctx.title.as_str()),
        ("description", ctx.description.as_str()),
        ("complexity", ctx.complexity.as_str()),
        ("test_cases", ctx.test_cases.as_str()),
        ("previous_submission", previous),
        ("submission", submission),
      ],
    );
    self.structured(PromptKind::Evaluation, body, OutputShape::EVALUATION)
  }

  pub fn build_guidance_prompt(&self, session: &Session, input: &str, tier: HintTier) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let history = format_history(session.problem_history(), self.history_window);
    let attempts = session.guidance().map(|g| g.attempts).unwrap_or(0).to_string();
    let max_attempts = session.max_attempts().to_string();
    let tier_level = tier.level().to_string();
    let body = fill_template(
      &self.prompts.guidance_template,
      &[
        ("problem", ctx.title.as_str()),
        ("description", ctx.description.as_str()),
        ("coach_notes", ctx.coach_notes.as_str()),
        ("submission", session.last_submission().unwrap_or("(not submitted yet)")),
        ("attempts", attempts.as_str()),
        ("max_attempts", max_attempts.as_str()),
        ("tier", tier_level.as_str()),
        ("tier_instruction", self.tier_instruction(tier)),
        ("history", history.as_str()),
        ("input", input),
      ],
    );
    self.structured(PromptKind::Guidance, body, OutputShape::GUIDANCE)
  }

  /// `asked_count` is the number of follow-ups already answered; the new question is number `asked_count + 1`.
  pub fn build_followup_prompt(&self, session: &Session, answer: &str, asked_count: u32) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let history = format_history(session.problem_history(), self.history_window);
    let asked = session.followup().map(|f| f.questions.as_slice()).unwrap_or(&[]);
    let number = (asked_count + 1).min(FOLLOWUP_TARGET).to_string();
    let total = FOLLOWUP_TARGET.to_string();
    let asked_questions = if asked.is_empty() {
      "(none yet)".to_string()
    } else {
      asked.iter().map(|q| format!("- {}", q)).collect::<Vec<_>>().join("\n")
    };
    let body = fill_template(
      &self.prompts.followup_template,
      &[
        ("problem", ctx.title.as_str()),
        ("description", ctx.description.as_str()),
        ("submission", session.last_submission().unwrap_or("(not recorded)")),
        ("number", number.as_str()),
        ("total", total.as_str()),
        ("asked_questions", asked_questions.as_str()),
        ("history", history.as_str()),
        ("answer", answer),
      ],
    );
    self.structured(PromptKind::FollowUp, body, OutputShape::FOLLOWUP)
  }

  /// The only builder allowed to reveal the solution.
  pub fn build_teaching_prompt(&self, session: &Session, question: Option<&str>) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let history = format_history(session.problem_history(), self.history_window);
    let user = fill_template(
      &self.prompts.teaching_template,
      &[
        ("problem", ctx.title.as_str()),
        ("description", ctx.description.as_str()),
        ("complexity", ctx.complexity.as_str()),
        ("test_cases", ctx.test_cases.as_str()),
        ("coach_notes", ctx.coach_notes.as_str()),
        ("submission", session.last_submission().unwrap_or("(no code submitted)")),
        ("history", history.as_str()),
        ("question", question.unwrap_or("(none)")),
      ],
    );
    PromptRequest {
      kind: PromptKind::Teaching,
      system: format!("{}\n\n{}", self.prompts.persona_system, TEACHING_PERMISSION),
      user,
      shape: None,
    }
  }

  pub fn build_answer_prompt(&self, session: &Session, question: &str) -> PromptRequest {
    let ctx = ProblemContext::of(session);
    let history = format_history(session.problem_history(), self.history_window);
    let user = fill_template(
      &self.prompts.answer_template,
      &[
        ("problem", ctx.title.as_str()),
        ("description", ctx.description.as_str()),
        ("history", history.as_str()),
        ("question", question),
      ],
    );
    PromptRequest { kind: PromptKind::Answer, system: self.guarded_system(), user, shape: None }
  }
}

/// Problem fields pre-rendered for template substitution.
struct ProblemContext {
  title: String,
  description: String,
  complexity: String,
  test_cases: String,
  coach_notes: String,
}

impl ProblemContext {
  fn of(session: &Session) -> Self {
    match session.problem() {
      Some(p) => Self {
        title: p.display_title(),
        description: p.description.clone(),
        complexity: if p.expected_complexity.is_empty() { "(unspecified)".into() } else { p.expected_complexity.clone() },
        test_cases: if p.test_cases.is_empty() {
          "(none)".into()
        } else {
          p.test_cases
            .iter()
            .enumerate()
            .map(|(i, tc)| format!("Case {}: input={} expected={}", i + 1, tc.input, tc.output))
            .collect::<Vec<_>>()
            .join("\n")
        },
        coach_notes: if p.solution_hints.is_empty() {
          "(none)".into()
        } else {
          p.solution_hints.iter().map(|h| format!("- {}", h)).collect::<Vec<_>>().join("\n")
        },
      },
      None => Self {
        title: "(no problem selected)".into(),
        description: String::new(),
        complexity: "(unspecified)".into(),
        test_cases: "(none)".into(),
        coach_notes: "(none)".into(),
      },
    }
  }
}

fn format_history(turns: &[Turn], window: usize) -> String {
  if turns.is_empty() {
    return "(no conversation yet)".into();
  }
  let start = turns.len().saturating_sub(window);
  turns[start..]
    .iter()
    .map(|t| {
      let who = match t.speaker {
        Speaker::Learner => "Learner",
        Speaker::Coach => "Coach",
      };
      format!("{}: {}", who, truncate_chars(&t.text, HISTORY_TURN_CHARS))
    })
    .collect::<Vec<_>>()
    .join("\n")
}
