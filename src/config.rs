//! Loading coach configuration (prompts, coaching limits, extra problems) from TOML.
//!
//! Every table is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [coaching]
//! max_guidance_attempts = 5
//! history_window = 10
//!
//! [prompts]
//! persona_system = "You are a calm, rigorous interview coach..."
//!
//! [[problems]]
//! title = "买卖股票的最佳时机"
//! title_en = "Best Time to Buy and Sell Stock"
//! description = "..."
//! difficulty = "easy"
//! expected_complexity = "O(n) 时间, O(1) 空间"
//! test_cases = [{ input = "prices = [7,1,5,3,6,4]", output = "5" }]
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Problem;
use crate::session::DEFAULT_MAX_GUIDANCE_ATTEMPTS;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CoachConfig {
  #[serde(default)]
  pub coaching: CoachingCfg,
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub problems: Vec<Problem>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoachingCfg {
  /// Failed guidance rounds before the coach switches to teaching.
  pub max_guidance_attempts: u32,
  /// How many recent turns are quoted back to the model.
  pub history_window: usize,
}

impl Default for CoachingCfg {
  fn default() -> Self {
    Self { max_guidance_attempts: DEFAULT_MAX_GUIDANCE_ATTEMPTS, history_window: 10 }
  }
}

/// Prompt texts used by the builders in `prompts`. `{placeholders}` are filled per call.
/// Override any subset in TOML to tune tone/structure; the no-solution rule is
/// appended by the builders and cannot be removed here.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub persona_system: String,
  pub intent_template: String,
  pub evaluation_template: String,
  pub guidance_template: String,
  pub followup_template: String,
  pub teaching_template: String,
  pub answer_template: String,
  pub tier1_instruction: String,
  pub tier2_instruction: String,
  pub tier3_instruction: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      persona_system: "You are an experienced algorithm-interview coach. You teach Socratically: you ask one focused question at a time and let the learner discover the answer. Be friendly, concise and natural. Reply in the same language the learner writes in.".into(),
      intent_template: "Classify the learner's latest message.\n\nPhase: {phase}\nProblem: {problem}\n\nRecent conversation:\n{history}\n\nLatest message:\n{input}\n\nLabels:\n- submitting_code: the message contains a code solution (full or partial)\n- asking_question: the learner asks about the problem, constraints or concepts\n- requesting_help: the learner is stuck and wants a hint\n- answering_followup: the learner answers a question the coach asked\n- other: greetings, off-topic or unintelligible text".into(),
      evaluation_template: "Judge whether the learner's submission solves the problem. Do not run it; reason about it, and trace it against the test cases.\n\nProblem: {problem}\n{description}\n\nExpected complexity: {complexity}\n\nTest cases:\n{test_cases}\n\nPrevious submission:\n```\n{previous_submission}\n```\n\nLatest submission:\n```\n{submission}\n```\n\nverdict is 'correct' only if the code is right on every case, including edge cases; use 'partially_correct' when the idea is right but details are wrong. rationale is a short internal justification. feedback is one or two sentences for the learner that name what is right or which area to re-check, never how to fix it.".into(),
      guidance_template: "The learner has not solved the problem yet. Produce the next guidance message.\n\nProblem: {problem}\n{description}\n\nCoach-only notes (never quote these):\n{coach_notes}\n\nLearner's latest code:\n```\n{submission}\n```\n\nGuidance round {attempts} of {max_attempts}. Hint tier {tier}/3:\n{tier_instruction}\n\nRecent conversation:\n{history}\n\nLearner's latest message:\n{input}\n\nWrite exactly one leading question or hint at this tier. Do not repeat a question already asked in the conversation.".into(),
      followup_template: "The learner solved the problem correctly. Ask comprehension question {number} of {total}.\n\nProblem: {problem}\n{description}\n\nLearner's accepted code:\n```\n{submission}\n```\n\nQuestions already asked:\n{asked_questions}\n\nRecent conversation:\n{history}\n\nLearner's answer to the previous question (may be empty):\n{answer}\n\nfeedback: one or two sentences on that answer (empty if there is none). question: one specific question about time/space complexity, edge cases, input variations or alternative approaches. It must differ from every question already asked.".into(),
      teaching_template: "The learner did not reach a correct solution, either because every guidance round was used up or because they chose to skip the problem. Now teach the problem completely.\n\nProblem: {problem}\n{description}\n\nExpected complexity: {complexity}\n\nTest cases:\n{test_cases}\n\nCoach notes:\n{coach_notes}\n\nLearner's latest code:\n```\n{submission}\n```\n\nRecent conversation:\n{history}\n\nLearner's latest message:\n{question}\n\nInclude: encouragement for the effort, the key insight, a step-by-step walk-through, a complete reference solution in the learner's language (Python if unknown), a complexity analysis, and the reusable pattern behind the problem. If the learner asked something, answer it too.".into(),
      answer_template: "The learner asked a question while working on the problem.\n\nProblem: {problem}\n{description}\n\nRecent conversation:\n{history}\n\nQuestion:\n{question}\n\nAnswer briefly and clearly, then invite the learner to keep going.".into(),
      tier1_instruction: "Light touch: ask only a guiding question about the learner's approach or the core difficulty. Name no data structure or algorithm.".into(),
      tier2_instruction: "Point at the specific gap in the learner's reasoning or code. You may name the relevant family of data structures or techniques, but not how to apply it.".into(),
      tier3_instruction: "Near-complete structural hint: describe the shape of the efficient approach (what to store, what to check at each step) and ask the learner to put it together. Still no code and no full algorithm statement.".into(),
    }
  }
}

impl CoachConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    let mut cfg: CoachConfig = toml::from_str(s)?;
    cfg.coaching.max_guidance_attempts = cfg.coaching.max_guidance_attempts.max(1);
    Ok(cfg)
  }
}

/// Attempt to load `CoachConfig` from COACH_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_coach_config_from_env() -> Option<CoachConfig> {
  let path = std::env::var("COACH_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match CoachConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "interview_coach", %path, extra_problems = cfg.problems.len(), "Loaded coach config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "interview_coach", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "interview_coach", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
