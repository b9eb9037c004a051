//! Domain models: problems, their difficulty, and test cases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How hard is the problem?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}
impl Default for Difficulty {
  fn default() -> Self { Difficulty::Medium }
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(format!("unknown difficulty '{}'", other)),
    }
  }
}

/// One example input with its expected output, both as display text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestCase {
  pub input: String,
  pub output: String,
}

/// Immutable problem record. Identity is the title (unique within a catalog).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
  pub title: String,
  /// English name, also accepted for lookup (e.g. "Two Sum").
  #[serde(default)] pub title_en: Option<String>,
  pub description: String,
  #[serde(default)] pub difficulty: Difficulty,
  #[serde(default)] pub expected_complexity: String,
  #[serde(default)] pub test_cases: Vec<TestCase>,
  /// Coach-only notes; never shown verbatim to the learner outside teaching.
  #[serde(default)] pub solution_hints: Vec<String>,
}

impl Problem {
  /// "两数之和 (Two Sum)" when an English name exists, else the bare title.
  pub fn display_title(&self) -> String {
    match &self.title_en {
      Some(en) if !en.is_empty() => format!("{} ({})", self.title, en),
      _ => self.title.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_parses_case_insensitively() {
    assert_eq!("Easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
    assert_eq!(" hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
    assert!("extreme".parse::<Difficulty>().is_err());
  }

  #[test]
  fn display_title_includes_english_name() {
    let p = Problem {
      title: "爬楼梯".into(),
      title_en: Some("Climbing Stairs".into()),
      description: String::new(),
      difficulty: Difficulty::Easy,
      expected_complexity: String::new(),
      test_cases: vec![],
      solution_hints: vec![],
    };
    assert_eq!(p.display_title(), "爬楼梯 (Climbing Stairs)");
  }
}
