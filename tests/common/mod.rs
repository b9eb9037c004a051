//! Scripted text generator for driving the coach in tests.
//!
//! Replies are queued per output shape (raw strings, parsed with the real
//! shape parser) plus one queue for free text. An empty queue answers
//! `Unavailable`, so a test that forgets to script a call fails loudly.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interview_coach::{Coach, GenerateError, OutputShape, ParsedResult, ProblemCatalog, TextGenerator};

#[derive(Clone, Debug)]
pub struct Call {
  pub shape: Option<&'static str>,
  pub prompt: String,
  pub system: Option<String>,
}

#[derive(Default)]
pub struct ScriptedGenerator {
  structured: Mutex<HashMap<&'static str, VecDeque<String>>>,
  text: Mutex<VecDeque<String>>,
  calls: Mutex<Vec<Call>>,
}

impl ScriptedGenerator {
  pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

  pub fn push(&self, shape: &OutputShape, raw: impl Into<String>) -> &Self {
    self.structured.lock().unwrap().entry(shape.name).or_default().push_back(raw.into());
    self
  }

  pub fn push_text(&self, text: impl Into<String>) -> &Self {
    self.text.lock().unwrap().push_back(text.into());
    self
  }

  pub fn intent(&self, label: &str) -> &Self {
    self.push(&OutputShape::INTENT, format!(r#"{{"intent": "{}"}}"#, label))
  }

  pub fn verdict(&self, verdict: &str, feedback: &str) -> &Self {
    self.push(
      &OutputShape::EVALUATION,
      format!(r#"{{"verdict": "{}", "rationale": "scripted", "feedback": "{}"}}"#, verdict, feedback),
    )
  }

  pub fn hint(&self, hint: &str) -> &Self {
    self.push(&OutputShape::GUIDANCE, format!(r#"{{"hint": "{}"}}"#, hint))
  }

  pub fn followup(&self, feedback: &str, question: &str) -> &Self {
    self.push(
      &OutputShape::FOLLOWUP,
      format!(r#"{{"feedback": "{}", "question": "{}"}}"#, feedback, question),
    )
  }

  pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

  /// Scripted replies nobody asked for.
  pub fn leftovers(&self) -> usize {
    let structured: usize = self.structured.lock().unwrap().values().map(|q| q.len()).sum();
    structured + self.text.lock().unwrap().len()
  }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
  async fn generate_text(&self, prompt: &str, system: Option<&str>) -> Result<String, GenerateError> {
    self.calls.lock().unwrap().push(Call { shape: None, prompt: prompt.into(), system: system.map(String::from) });
    self
      .text
      .lock()
      .unwrap()
      .pop_front()
      .ok_or_else(|| GenerateError::Unavailable("no scripted text".into()))
  }

  async fn generate_structured(
    &self,
    prompt: &str,
    system: Option<&str>,
    shape: &OutputShape,
  ) -> Result<ParsedResult, GenerateError> {
    self.calls.lock().unwrap().push(Call { shape: Some(shape.name), prompt: prompt.into(), system: system.map(String::from) });
    let raw = self
      .structured
      .lock()
      .unwrap()
      .get_mut(shape.name)
      .and_then(|q| q.pop_front())
      .ok_or_else(|| GenerateError::Unavailable(format!("no scripted {} output", shape.name)))?;
    shape.parse(&raw)
  }
}

pub fn coach_with(generator: Arc<ScriptedGenerator>) -> Coach {
  Coach::with_defaults(generator, Arc::new(ProblemCatalog::default()))
}

pub const TWO_SUM_CODE: &str = "def two_sum(nums, target):\n    seen = {}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i";

pub const WRONG_CODE: &str = "def two_sum(nums, target):\n    return [0, 1]";
