//! The text-generation capability the coach depends on.
//!
//! The controller never talks to a provider directly: it goes through
//! [`TextGenerator`], which offers free text and shape-checked structured output.
//! Implementations live in `openai` (remote) and `offline` (canned); tests plug
//! in their own scripted fixture.
//!
//! Structured replies are parsed leniently (bare JSON, fenced JSON, or the
//! outermost `{...}` span) and then validated against an [`OutputShape`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::GenerateError;

#[async_trait]
pub trait TextGenerator: Send + Sync {
  /// Free-form reply to `prompt`, optionally steered by a system instruction.
  async fn generate_text(&self, prompt: &str, system: Option<&str>) -> Result<String, GenerateError>;

  /// Reply parsed into `shape`; `GenerateError::MalformedOutput` if it does not fit.
  async fn generate_structured(
    &self,
    prompt: &str,
    system: Option<&str>,
    shape: &OutputShape,
  ) -> Result<ParsedResult, GenerateError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
  /// Any string.
  Text,
  /// One of a fixed set of snake_case labels.
  Label(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
  pub name: &'static str,
  pub kind: FieldKind,
  pub required: bool,
}

const fn text(name: &'static str) -> FieldSpec {
  FieldSpec { name, kind: FieldKind::Text, required: true }
}

const fn optional_text(name: &'static str) -> FieldSpec {
  FieldSpec { name, kind: FieldKind::Text, required: false }
}

const fn label(name: &'static str, allowed: &'static [&'static str]) -> FieldSpec {
  FieldSpec { name, kind: FieldKind::Label(allowed), required: true }
}

pub const INTENT_LABELS: &[&str] = &[
  "submitting_code",
  "asking_question",
  "requesting_help",
  "answering_followup",
  "other",
];

pub const VERDICT_LABELS: &[&str] = &["correct", "incorrect", "partially_correct"];

/// Description of the JSON object a structured call must return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputShape {
  pub name: &'static str,
  pub fields: &'static [FieldSpec],
}

impl OutputShape {
  pub const INTENT: OutputShape = OutputShape {
    name: "intent",
    fields: &[label("intent", INTENT_LABELS)],
  };

  pub const EVALUATION: OutputShape = OutputShape {
    name: "evaluation",
    fields: &[label("verdict", VERDICT_LABELS), text("rationale"), optional_text("feedback")],
  };

  pub const GUIDANCE: OutputShape = OutputShape {
    name: "guidance",
    fields: &[text("hint")],
  };

  pub const FOLLOWUP: OutputShape = OutputShape {
    name: "followup",
    fields: &[optional_text("feedback"), text("question")],
  };

  /// JSON skeleton shown to the model, e.g. `{"verdict": "correct|incorrect", "rationale": "<text>"}`.
  pub fn describe(&self) -> String {
    let parts: Vec<String> = self
      .fields
      .iter()
      .map(|f| {
        let value = match f.kind {
          FieldKind::Text if f.required => "<text>".to_string(),
          FieldKind::Text => "<text, may be empty>".to_string(),
          FieldKind::Label(allowed) => allowed.join("|"),
        };
        format!("\"{}\": \"{}\"", f.name, value)
      })
      .collect();
    format!("{{{}}}", parts.join(", "))
  }

  /// Extract a JSON object from raw model output and validate it against the shape.
  pub fn parse(&self, raw: &str) -> Result<ParsedResult, GenerateError> {
    let mut obj = extract_json_object(raw).ok_or_else(|| self.malformed("no JSON object found"))?;

    for field in self.fields {
      match obj.get(field.name).cloned() {
        None | Some(Value::Null) if !field.required => {
          obj.insert(field.name.to_string(), Value::String(String::new()));
        }
        None | Some(Value::Null) => {
          return Err(self.malformed(format!("missing field '{}'", field.name)));
        }
        Some(Value::String(s)) => {
          if let FieldKind::Label(allowed) = field.kind {
            let norm = normalize_label(&s);
            if !allowed.contains(&norm.as_str()) {
              return Err(self.malformed(format!("'{}' is not a valid {}", s, field.name)));
            }
            obj.insert(field.name.to_string(), Value::String(norm));
          } else if field.required && s.trim().is_empty() {
            return Err(self.malformed(format!("field '{}' is empty", field.name)));
          }
        }
        Some(_) => {
          return Err(self.malformed(format!("field '{}' is not a string", field.name)));
        }
      }
    }

    Ok(ParsedResult { shape: self.name, fields: obj })
  }

  fn malformed(&self, detail: impl Into<String>) -> GenerateError {
    GenerateError::MalformedOutput { shape: self.name, detail: detail.into() }
  }
}

/// A structured reply that already passed shape validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedResult {
  shape: &'static str,
  fields: Map<String, Value>,
}

impl ParsedResult {
  #[cfg(test)]
  pub fn shape(&self) -> &'static str { self.shape }

  #[cfg(test)]
  pub fn text(&self, field: &str) -> Option<&str> {
    self.fields.get(field).and_then(Value::as_str)
  }

  /// Deserialize into a typed view (the shape guarantees the fields exist).
  pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, GenerateError> {
    let shape = self.shape;
    serde_json::from_value(Value::Object(self.fields))
      .map_err(|e| GenerateError::MalformedOutput { shape, detail: e.to_string() })
  }
}

fn normalize_label(s: &str) -> String {
  s.trim()
    .trim_matches(|c| c == '"' || c == '\'')
    .to_lowercase()
    .replace([' ', '-'], "_")
}

fn as_object(candidate: &str) -> Option<Map<String, Value>> {
  match serde_json::from_str::<Value>(candidate.trim()) {
    Ok(Value::Object(map)) => Some(map),
    _ => None,
  }
}

/// Content of the first fenced block, preferring one tagged `json`.
fn fenced_block(raw: &str) -> Option<&str> {
  let start = raw.find("```json").map(|i| i + "```json".len()).or_else(|| {
    raw.find("```").map(|i| {
      // skip an optional language tag on the opening fence line
      let after = i + 3;
      raw[after..].find('\n').map(|nl| after + nl + 1).unwrap_or(after)
    })
  })?;
  let end = raw[start..].find("```")?;
  Some(&raw[start..start + end])
}

pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
  if let Some(map) = as_object(raw) {
    return Some(map);
  }
  if let Some(map) = fenced_block(raw).and_then(as_object) {
    return Some(map);
  }
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  if end <= start {
    return None;
  }
  as_object(&raw[start..=end])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_bare_json() {
    let r = OutputShape::INTENT.parse(r#"{"intent": "submitting_code"}"#).unwrap();
    assert_eq!(r.text("intent"), Some("submitting_code"));
    assert_eq!(r.shape(), "intent");
  }

  #[test]
  fn parses_fenced_json_with_surrounding_prose() {
    let raw = "Sure, here it is:\n```json\n{\"verdict\": \"correct\", \"rationale\": \"handles all cases\"}\n```\nGood luck!";
    let r = OutputShape::EVALUATION.parse(raw).unwrap();
    assert_eq!(r.text("verdict"), Some("correct"));
    assert_eq!(r.text("feedback"), Some(""));
  }

  #[test]
  fn parses_untagged_fence_and_brace_span() {
    let raw = "```\n{\"hint\": \"What do you need to look up quickly?\"}\n```";
    assert!(OutputShape::GUIDANCE.parse(raw).is_ok());
    let raw = "Answer: {\"question\": \"What is the space cost?\"} -- end";
    let r = OutputShape::FOLLOWUP.parse(raw).unwrap();
    assert_eq!(r.text("question"), Some("What is the space cost?"));
  }

  #[test]
  fn normalizes_labels() {
    let r = OutputShape::EVALUATION
      .parse(r#"{"verdict": " Partially-Correct ", "rationale": "misses duplicates"}"#)
      .unwrap();
    assert_eq!(r.text("verdict"), Some("partially_correct"));
  }

  #[test]
  fn rejects_unknown_label_missing_field_and_garbage() {
    let err = OutputShape::INTENT.parse(r#"{"intent": "dancing"}"#).unwrap_err();
    assert!(matches!(err, GenerateError::MalformedOutput { shape: "intent", .. }));
    assert!(OutputShape::EVALUATION.parse(r#"{"verdict": "correct"}"#).is_err());
    assert!(OutputShape::GUIDANCE.parse("I think you should use a hash map.").is_err());
    assert!(OutputShape::GUIDANCE.parse(r#"{"hint": "   "}"#).is_err());
    assert!(OutputShape::GUIDANCE.parse(r#"{"hint": 3}"#).is_err());
  }

  #[test]
  fn describe_lists_every_field() {
    let d = OutputShape::EVALUATION.describe();
    assert!(d.contains("\"verdict\": \"correct|incorrect|partially_correct\""));
    assert!(d.contains("\"rationale\""));
    assert!(d.contains("\"feedback\""));
  }

  #[test]
  fn typed_view_deserializes() {
    #[derive(serde::Deserialize)]
    struct G { hint: String }
    let g: G = OutputShape::GUIDANCE.parse(r#"{"hint": "think about lookups"}"#).unwrap().into_typed().unwrap();
    assert_eq!(g.hint, "think about lookups");
  }
}
