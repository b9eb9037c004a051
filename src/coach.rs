//! The session controller.
//!
//! `Coach::handle_turn` drives one learner message through the state machine:
//! classify, evaluate, then guide / follow up / teach. Every generator call is
//! retried once with a stricter formatting instruction before the turn fails.
//!
//! A turn runs on a draft copy of the session and is committed only when it
//! completes, so a failed or cancelled turn leaves the caller's session as it was.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{ProblemCatalog, ProblemChoice};
use crate::config::{CoachingCfg, Prompts};
use crate::domain::Problem;
use crate::error::{CoachError, GenerateError};
use crate::llm::TextGenerator;
use crate::prompts::{PromptBuilder, PromptRequest};
use crate::session::{hint_tier, PhaseKind, Session, SessionPhase, Speaker, FOLLOWUP_TARGET};
use crate::util::trunc_for_log;

const SKIP_KEYWORDS: &[&str] = &["跳过", "换题", "换一题", "下一题", "skip", "next problem"];

const HELP_KEYWORDS: &[&str] = &["hint", "help", "提示", "帮助", "不会", "不知道", "怎么做"];

const CODE_LINE_PREFIXES: &[&str] = &["def ", "fn ", "class ", "function ", "func ", "public ", "impl ", "#include"];

const NO_PROBLEM_REPLY: &str = "请先选择一道题目，我们再开始练习。";

const DONE_REPLY: &str = "这道题我们已经讨论完了。想继续练习下一道题吗？选一道新题就可以开始。";

const CLARIFY_REPLY: &str = "我没太明白你的意思。你可以直接贴出代码，问我关于题目的问题，或者说「提示」来获取一点方向。";

const FOLLOWUP_CLARIFY_REPLY: &str = "我没太明白你的回答。能再具体说说你对上一个问题的想法吗？";

/// What the UI shows after a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoachReply {
  pub text: String,
  pub phase: PhaseKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
  SubmittingCode,
  AskingQuestion,
  RequestingHelp,
  AnsweringFollowup,
  /// Give up on the problem and see the solution. Only produced by the keyword rules.
  SkippingProblem,
  Other,
}

impl Intent {
  pub fn as_str(&self) -> &'static str {
    match self {
      Intent::SubmittingCode => "submitting_code",
      Intent::AskingQuestion => "asking_question",
      Intent::RequestingHelp => "requesting_help",
      Intent::AnsweringFollowup => "answering_followup",
      Intent::SkippingProblem => "skipping_problem",
      Intent::Other => "other",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Correct,
  Incorrect,
  PartiallyCorrect,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Evaluation {
  pub verdict: Verdict,
  pub rationale: String,
  #[serde(default)]
  pub feedback: String,
}

#[derive(Deserialize)]
struct IntentOut {
  intent: Intent,
}

#[derive(Deserialize)]
struct GuidanceOut {
  hint: String,
}

#[derive(Deserialize)]
struct FollowUpOut {
  #[serde(default)]
  feedback: String,
  question: String,
}

/// Whether a turn moved the dialogue forward (committed, recorded in history) or not.
enum TurnOutcome {
  Advance(String),
  Hold(String),
}

/// Cheap keyword rules tried before asking the classifier.
pub fn quick_intent(input: &str) -> Option<Intent> {
  if looks_like_code(input) {
    return Some(Intent::SubmittingCode);
  }
  let lower = input.to_lowercase();
  if SKIP_KEYWORDS.iter().any(|k| lower.contains(k)) {
    return Some(Intent::SkippingProblem);
  }
  if HELP_KEYWORDS.iter().any(|k| lower.contains(k)) {
    return Some(Intent::RequestingHelp);
  }
  None
}

fn looks_like_code(input: &str) -> bool {
  if input.contains("```") {
    return true;
  }
  if input.lines().any(|l| {
    let l = l.trim_start();
    CODE_LINE_PREFIXES.iter().any(|p| l.starts_with(p))
  }) {
    return true;
  }
  input
    .lines()
    .filter(|l| l.trim_end().ends_with(['{', '}', ';', ':']))
    .count()
    >= 2
}

fn opening_message(problem: &Problem) -> String {
  format!(
    "好的，我们来看这道题：\n\n**{}**（难度：{}）\n\n{}\n\n先想一想思路，然后把代码或想法发给我。需要提示的话随时说。",
    problem.display_title(),
    problem.difficulty,
    problem.description
  )
}

fn completion_message(problem_title: &str) -> String {
  format!(
    "太棒了，「{}」这道题你已经完整拿下了！\n\n- 代码通过了评估\n- 回答了全部 {} 个追问\n\n准备好挑战下一道题了吗？",
    problem_title, FOLLOWUP_TARGET
  )
}

/// Joins a short remark and the main message, skipping whichever is blank.
fn join_reply(lead: &str, body: &str) -> String {
  match (lead.trim().is_empty(), body.trim().is_empty()) {
    (true, _) => body.trim().to_string(),
    (false, true) => lead.trim().to_string(),
    (false, false) => format!("{}\n\n{}", lead.trim(), body.trim()),
  }
}

pub struct Coach {
  generator: Arc<dyn TextGenerator>,
  catalog: Arc<ProblemCatalog>,
  prompts: PromptBuilder,
  max_attempts: u32,
}

impl Coach {
  pub fn new(
    generator: Arc<dyn TextGenerator>,
    catalog: Arc<ProblemCatalog>,
    coaching: &CoachingCfg,
    prompts: Prompts,
  ) -> Self {
    Self {
      generator,
      catalog,
      prompts: PromptBuilder::new(prompts, coaching.history_window),
      max_attempts: coaching.max_guidance_attempts.max(1),
    }
  }

  /// Default limits and prompt texts.
  pub fn with_defaults(generator: Arc<dyn TextGenerator>, catalog: Arc<ProblemCatalog>) -> Self {
    Self::new(generator, catalog, &CoachingCfg::default(), Prompts::default())
  }

  pub fn catalog(&self) -> &ProblemCatalog { &self.catalog }

  pub fn start_session(&self) -> Session {
    let session = Session::new(self.max_attempts);
    info!(target: "coach", session = %session.id(), max_attempts = self.max_attempts, "Session started");
    session
  }

  /// Activate a problem (by title or at random) and greet with its statement.
  /// On `ProblemNotFound` the session is left untouched.
  #[instrument(level = "info", skip(self, session), fields(session = %session.id()))]
  pub fn select_problem(&self, session: &mut Session, choice: &ProblemChoice) -> Result<CoachReply, CoachError> {
    let problem = self.catalog.resolve(choice).map_err(|e| {
      warn!(target: "coach", ?choice, "No problem matches the selection");
      e
    })?;
    let opening = opening_message(&problem);
    info!(target: "coach", title = %problem.title, difficulty = %problem.difficulty, "Problem selected");
    session.select_problem(problem);
    session.record_turn(Speaker::Coach, opening.clone());
    Ok(CoachReply { text: opening, phase: session.phase_kind() })
  }

  /// Process one learner message. The session advances only if the whole turn succeeds.
  #[instrument(
    level = "info",
    skip(self, session, input),
    fields(session = %session.id(), phase = %session.phase_kind(), input_len = input.len())
  )]
  pub async fn handle_turn(&self, session: &mut Session, input: &str) -> Result<CoachReply, CoachError> {
    let input = input.trim();
    let mut draft = session.clone();

    let outcome = match draft.phase().clone() {
      SessionPhase::NoProblem => TurnOutcome::Hold(NO_PROBLEM_REPLY.to_string()),
      SessionPhase::Done => TurnOutcome::Hold(DONE_REPLY.to_string()),
      SessionPhase::AwaitingSubmission => self.on_awaiting(&mut draft, input).await?,
      SessionPhase::Guiding(g) if g.is_exhausted() => self.on_exhausted(&mut draft, input).await?,
      SessionPhase::Guiding(_) => self.on_guiding(&mut draft, input).await?,
      SessionPhase::FollowUp(_) => self.on_followup(&mut draft, input).await?,
      SessionPhase::Teaching => self.on_teaching(&mut draft, input).await?,
    };

    match outcome {
      TurnOutcome::Advance(text) => {
        draft.record_turn(Speaker::Learner, input);
        draft.record_turn(Speaker::Coach, text.clone());
        if draft.phase_kind() != session.phase_kind() {
          info!(target: "coach", from = %session.phase_kind(), to = %draft.phase_kind(), "Turn advanced phase");
        }
        *session = draft;
        Ok(CoachReply { text, phase: session.phase_kind() })
      }
      TurnOutcome::Hold(text) => {
        debug!(target: "coach", "Turn held; session unchanged");
        Ok(CoachReply { text, phase: session.phase_kind() })
      }
    }
  }

  async fn classify(&self, session: &Session, input: &str, allow_quick: bool) -> Result<Intent, CoachError> {
    if allow_quick {
      if let Some(intent) = quick_intent(input) {
        debug!(target: "coach", intent = intent.as_str(), "Intent from keyword rules");
        return Ok(intent);
      }
    }
    let req = self.prompts.build_intent_prompt(session, input);
    let out: IntentOut = self.ask_structured(&req).await?;
    debug!(target: "coach", intent = out.intent.as_str(), "Intent from classifier");
    Ok(out.intent)
  }

  async fn evaluate(&self, session: &Session, submission: &str) -> Result<Evaluation, CoachError> {
    let req = self.prompts.build_evaluation_prompt(session, submission);
    let eval: Evaluation = self.ask_structured(&req).await?;
    info!(target: "coach", verdict = ?eval.verdict, rationale = %trunc_for_log(&eval.rationale, 160), "Submission evaluated");
    Ok(eval)
  }

  /// Guidance hint for the session's current attempt count.
  async fn guide(&self, session: &Session, input: &str) -> Result<String, CoachError> {
    let attempts = session.guidance().map(|g| g.attempts).unwrap_or(0);
    let tier = hint_tier(attempts);
    let req = self.prompts.build_guidance_prompt(session, input, tier);
    let out: GuidanceOut = self.ask_structured(&req).await?;
    debug!(target: "coach", attempts, tier = tier.level(), "Guidance produced");
    Ok(out.hint)
  }

  /// Switch to follow-up and put question #1.
  async fn start_followup(&self, session: &mut Session, lead: &str) -> Result<String, CoachError> {
    session.enter_followup()?;
    let req = self.prompts.build_followup_prompt(session, "", 0);
    let out: FollowUpOut = self.ask_structured(&req).await?;
    session.note_followup_question(out.question.clone())?;
    Ok(join_reply(lead, &out.question))
  }

  async fn on_awaiting(&self, session: &mut Session, input: &str) -> Result<TurnOutcome, CoachError> {
    match self.classify(session, input, true).await? {
      Intent::SubmittingCode => {
        let eval = self.evaluate(session, input).await?;
        session.record_submission(input)?;
        if eval.verdict == Verdict::Correct {
          return Ok(TurnOutcome::Advance(self.start_followup(session, &eval.feedback).await?));
        }
        session.enter_guidance()?;
        let hint = self.guide(session, input).await?;
        Ok(TurnOutcome::Advance(join_reply(&eval.feedback, &hint)))
      }
      Intent::RequestingHelp => {
        session.enter_guidance()?;
        Ok(TurnOutcome::Advance(self.guide(session, input).await?))
      }
      Intent::AskingQuestion | Intent::AnsweringFollowup => {
        let req = self.prompts.build_answer_prompt(session, input);
        Ok(TurnOutcome::Advance(self.ask_text(&req).await?))
      }
      Intent::SkippingProblem => self.on_skip(session).await,
      Intent::Other => Ok(TurnOutcome::Hold(CLARIFY_REPLY.to_string())),
    }
  }

  /// Every reply during guidance is evaluated again; a miss costs one attempt.
  async fn on_guiding(&self, session: &mut Session, input: &str) -> Result<TurnOutcome, CoachError> {
    let intent = self.classify(session, input, true).await?;
    match intent {
      Intent::Other => return Ok(TurnOutcome::Hold(CLARIFY_REPLY.to_string())),
      Intent::SkippingProblem => return self.on_skip(session).await,
      _ => {}
    }

    let eval = self.evaluate(session, input).await?;
    if intent == Intent::SubmittingCode {
      session.record_submission(input)?;
    }
    if eval.verdict == Verdict::Correct {
      return Ok(TurnOutcome::Advance(self.start_followup(session, &eval.feedback).await?));
    }

    let attempts = session.record_guidance_attempt()?;
    info!(target: "coach", attempts, max = session.max_attempts(), tier = hint_tier(attempts).level(), "Guidance round missed");
    let hint = self.guide(session, input).await?;
    Ok(TurnOutcome::Advance(join_reply(&eval.feedback, &hint)))
  }

  /// The learner gives up: teach the solution and close the problem in one turn.
  async fn on_skip(&self, session: &mut Session) -> Result<TurnOutcome, CoachError> {
    info!(target: "coach", phase = %session.phase_kind(), "Problem skipped; teaching");
    session.skip_problem()?;
    let req = self.prompts.build_teaching_prompt(session, None);
    let text = self.ask_text(&req).await?;
    session.finish()?;
    Ok(TurnOutcome::Advance(text))
  }

  /// Budget spent: teach without evaluating the latest reply.
  async fn on_exhausted(&self, session: &mut Session, input: &str) -> Result<TurnOutcome, CoachError> {
    info!(target: "coach", "Guidance budget exhausted; teaching");
    session.enter_teaching()?;
    let req = self.prompts.build_teaching_prompt(session, Some(input));
    Ok(TurnOutcome::Advance(self.ask_text(&req).await?))
  }

  async fn on_teaching(&self, session: &mut Session, input: &str) -> Result<TurnOutcome, CoachError> {
    let req = self.prompts.build_teaching_prompt(session, Some(input));
    let text = self.ask_text(&req).await?;
    session.finish()?;
    Ok(TurnOutcome::Advance(text))
  }

  async fn on_followup(&self, session: &mut Session, input: &str) -> Result<TurnOutcome, CoachError> {
    if self.classify(session, input, false).await? == Intent::Other {
      return Ok(TurnOutcome::Hold(FOLLOWUP_CLARIFY_REPLY.to_string()));
    }

    let answered = session.record_followup_asked()?;
    if answered >= FOLLOWUP_TARGET {
      let title = session.problem().map(|p| p.title.clone()).unwrap_or_default();
      session.finish()?;
      info!(target: "coach", answered, "Follow-up loop complete");
      return Ok(TurnOutcome::Advance(completion_message(&title)));
    }

    let req = self.prompts.build_followup_prompt(session, input, answered);
    let out: FollowUpOut = self.ask_structured(&req).await?;
    session.note_followup_question(out.question.clone())?;
    Ok(TurnOutcome::Advance(join_reply(&out.feedback, &out.question)))
  }

  /// Structured call with one stricter retry on any failure.
  async fn ask_structured<T: DeserializeOwned>(&self, req: &PromptRequest) -> Result<T, CoachError> {
    match self.try_structured(req).await {
      Ok(v) => Ok(v),
      Err(first) => {
        warn!(target: "coach", prompt = req.kind.as_str(), error = %first, "Generation failed; retrying with stricter format");
        self.try_structured(&req.stricter()).await.map_err(|e| {
          error!(target: "coach", prompt = req.kind.as_str(), error = %e, "Generation failed after retry");
          CoachError::Generation(e)
        })
      }
    }
  }

  async fn try_structured<T: DeserializeOwned>(&self, req: &PromptRequest) -> Result<T, GenerateError> {
    let Some(shape) = req.shape else {
      return Err(GenerateError::MalformedOutput { shape: "text", detail: "structured call without a shape".into() });
    };
    self
      .generator
      .generate_structured(&req.user, Some(&req.system), &shape)
      .await?
      .into_typed()
  }

  /// Free-text call; an empty reply counts as malformed and gets the same single retry.
  async fn ask_text(&self, req: &PromptRequest) -> Result<String, CoachError> {
    match self.try_text(req).await {
      Ok(v) => Ok(v),
      Err(first) => {
        warn!(target: "coach", prompt = req.kind.as_str(), error = %first, "Generation failed; retrying with stricter format");
        self.try_text(&req.stricter()).await.map_err(|e| {
          error!(target: "coach", prompt = req.kind.as_str(), error = %e, "Generation failed after retry");
          CoachError::Generation(e)
        })
      }
    }
  }

  async fn try_text(&self, req: &PromptRequest) -> Result<String, GenerateError> {
    let text = self.generator.generate_text(&req.user, Some(&req.system)).await?;
    let text = text.trim();
    if text.is_empty() {
      return Err(GenerateError::MalformedOutput { shape: "text", detail: "empty reply".into() });
    }
    Ok(text.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn code_is_recognised_without_the_classifier() {
    assert_eq!(quick_intent("def two_sum(nums, target):\n    pass"), Some(Intent::SubmittingCode));
    assert_eq!(quick_intent("```\nx = 1\n```"), Some(Intent::SubmittingCode));
    assert_eq!(quick_intent("fn main() {\n}"), Some(Intent::SubmittingCode));
    assert_eq!(quick_intent("for (i = 0; i < n; i++) {\n  sum += a[i];\n}"), Some(Intent::SubmittingCode));
    // "help" inside an identifier still reads as code
    assert_eq!(quick_intent("def helper(x):\n    return x"), Some(Intent::SubmittingCode));
  }

  #[test]
  fn help_keywords_mean_requesting_help() {
    assert_eq!(quick_intent("能给我一点提示吗"), Some(Intent::RequestingHelp));
    assert_eq!(quick_intent("我不知道怎么做"), Some(Intent::RequestingHelp));
    assert_eq!(quick_intent("Can I get a HINT?"), Some(Intent::RequestingHelp));
  }

  #[test]
  fn skip_keywords_mean_skipping() {
    assert_eq!(quick_intent("跳过"), Some(Intent::SkippingProblem));
    assert_eq!(quick_intent("这题太难了，换一题吧"), Some(Intent::SkippingProblem));
    assert_eq!(quick_intent("Next problem please"), Some(Intent::SkippingProblem));
    // skip wins over a help keyword in the same message
    assert_eq!(quick_intent("不会，跳过"), Some(Intent::SkippingProblem));
    // code mentioning skip is still code
    assert_eq!(quick_intent("def skip(xs):\n    return xs[1:]"), Some(Intent::SubmittingCode));
  }

  #[test]
  fn plain_prose_goes_to_the_classifier() {
    assert_eq!(quick_intent("数组里可以有负数吗？"), None);
    assert_eq!(quick_intent("Note: the array is sorted."), None);
    assert_eq!(quick_intent("hello"), None);
  }

  #[test]
  fn canned_texts_name_the_problem() {
    let p = crate::seeds::seed_problems().remove(0);
    let opening = opening_message(&p);
    assert!(opening.contains("两数之和 (Two Sum)"));
    assert!(opening.contains("easy"));
    assert!(opening.contains(&p.description));
    assert!(completion_message("两数之和").contains("3 个追问"));
  }

  #[test]
  fn join_reply_skips_blank_parts() {
    assert_eq!(join_reply("", "Q?"), "Q?");
    assert_eq!(join_reply(" Nice. ", "Q?"), "Nice.\n\nQ?");
    assert_eq!(join_reply("Nice.", "  "), "Nice.");
  }
}
