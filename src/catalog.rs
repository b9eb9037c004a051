//! Problem catalog: built-in seeds plus problems from the TOML config.
//!
//! Titles are unique. A configured problem whose title collides with an
//! existing one is skipped and logged.

use rand::seq::SliceRandom;
use tracing::{debug, error};

use crate::domain::{Difficulty, Problem};
use crate::error::CoachError;
use crate::seeds::seed_problems;

/// How the learner picks a problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProblemChoice {
  Title(String),
  Random { difficulty: Option<Difficulty> },
}

#[derive(Clone, Debug)]
pub struct ProblemCatalog {
  problems: Vec<Problem>,
}

impl Default for ProblemCatalog {
  fn default() -> Self { Self::new(Vec::new()) }
}

impl ProblemCatalog {
  /// Seeds first, then `extra` in config order.
  pub fn new(extra: Vec<Problem>) -> Self {
    let mut problems = seed_problems();
    for p in extra {
      if problems.iter().any(|q| q.title == p.title) {
        error!(target: "interview_coach", title = %p.title, "Duplicate problem title in config; skipping");
        continue;
      }
      problems.push(p);
    }
    debug!(target: "interview_coach", count = problems.len(), "Problem catalog ready");
    Self { problems }
  }

  pub fn list(&self) -> &[Problem] { &self.problems }

  pub fn len(&self) -> usize { self.problems.len() }

  pub fn is_empty(&self) -> bool { self.problems.is_empty() }

  pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<&Problem> {
    self.problems.iter().filter(|p| p.difficulty == difficulty).collect()
  }

  /// Exact title, English title or display title first; then a case-insensitive substring.
  pub fn by_title(&self, query: &str) -> Option<&Problem> {
    let q = query.trim();
    if q.is_empty() {
      return None;
    }
    let exact = self.problems.iter().find(|p| {
      p.title == q
        || p.title_en.as_deref().map(|en| en.eq_ignore_ascii_case(q)).unwrap_or(false)
        || p.display_title() == q
    });
    if exact.is_some() {
      return exact;
    }
    let needle = q.to_lowercase();
    self.problems.iter().find(|p| {
      p.title.to_lowercase().contains(&needle)
        || p.title_en.as_deref().map(|en| en.to_lowercase().contains(&needle)).unwrap_or(false)
    })
  }

  pub fn random(&self, difficulty: Option<Difficulty>) -> Option<&Problem> {
    let pool: Vec<&Problem> = match difficulty {
      Some(d) => self.by_difficulty(d),
      None => self.problems.iter().collect(),
    };
    pool.choose(&mut rand::thread_rng()).copied()
  }

  pub fn resolve(&self, choice: &ProblemChoice) -> Result<Problem, CoachError> {
    match choice {
      ProblemChoice::Title(t) => self
        .by_title(t)
        .cloned()
        .ok_or_else(|| CoachError::ProblemNotFound(t.clone())),
      ProblemChoice::Random { difficulty } => self.random(*difficulty).cloned().ok_or_else(|| {
        CoachError::ProblemNotFound(match difficulty {
          Some(d) => format!("any {} problem", d),
          None => "any problem".to_string(),
        })
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extra(title: &str, difficulty: Difficulty) -> Problem {
    Problem {
      title: title.into(),
      title_en: None,
      description: "desc".into(),
      difficulty,
      expected_complexity: String::new(),
      test_cases: Vec::new(),
      solution_hints: Vec::new(),
    }
  }

  #[test]
  fn seeds_are_always_present() {
    let c = ProblemCatalog::default();
    assert_eq!(c.len(), 8);
    assert_eq!(c.list()[0].title, "两数之和");
  }

  #[test]
  fn duplicate_config_titles_are_skipped() {
    let c = ProblemCatalog::new(vec![extra("两数之和", Difficulty::Hard), extra("接雨水", Difficulty::Hard)]);
    assert_eq!(c.len(), 9);
    assert_eq!(c.by_title("两数之和").unwrap().difficulty, Difficulty::Easy);
    assert_eq!(c.by_difficulty(Difficulty::Hard).len(), 1);
  }

  #[test]
  fn lookup_accepts_english_and_partial_titles() {
    let c = ProblemCatalog::default();
    assert_eq!(c.by_title("two sum").unwrap().title, "两数之和");
    assert_eq!(c.by_title("两数之和 (Two Sum)").unwrap().title, "两数之和");
    assert_eq!(c.by_title("括号").unwrap().title, "有效的括号");
    assert_eq!(c.by_title("coin").unwrap().title, "零钱兑换");
    assert!(c.by_title("  ").is_none());
    assert!(c.by_title("red-black tree").is_none());
  }

  #[test]
  fn random_respects_difficulty() {
    let c = ProblemCatalog::default();
    for _ in 0..20 {
      assert_eq!(c.random(Some(Difficulty::Medium)).unwrap().difficulty, Difficulty::Medium);
    }
    assert!(c.random(Some(Difficulty::Hard)).is_none());
    assert!(c.random(None).is_some());
  }

  #[test]
  fn resolve_reports_missing_problems() {
    let c = ProblemCatalog::default();
    assert_eq!(c.resolve(&ProblemChoice::Title("反转链表".into())).unwrap().title, "反转链表");
    let err = c.resolve(&ProblemChoice::Title("nope".into())).unwrap_err();
    assert!(matches!(err, CoachError::ProblemNotFound(ref t) if t == "nope"));
    let err = c.resolve(&ProblemChoice::Random { difficulty: Some(Difficulty::Hard) }).unwrap_err();
    assert_eq!(err.kind(), "problem_not_found");
  }
}
