//! Local text generator used when no OPENAI_API_KEY is configured.
//!
//! Deterministic and deliberately modest: it cannot judge code, so every
//! evaluation comes back `partially_correct` and the learner is steered through
//! guidance (and eventually teaching). Enough to exercise the whole dialogue
//! without credentials.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::catalog::ProblemCatalog;
use crate::coach::quick_intent;
use crate::domain::Problem;
use crate::error::GenerateError;
use crate::llm::{OutputShape, ParsedResult, TextGenerator};
use crate::prompts::NO_SOLUTION_RULE;

const TIER_HINTS: [&str; 3] = [
  "（离线模式）先别急着写代码。用你自己的话说说：暴力解法是什么？它慢在哪里？",
  "（离线模式）看看你的解法里重复做的工作：有没有哪一步可以借助合适的数据结构一次完成？",
  "（离线模式）试着在遍历时记住已经见过的信息，每一步只检查当前元素需要的那一个条件。你能把这个结构写出来吗？",
];

const FOLLOWUP_QUESTIONS: [&str; 3] = [
  "你的解法时间复杂度和空间复杂度分别是多少？为什么？",
  "有哪些边界情况需要特别注意？你的代码是怎么处理它们的？",
  "如果输入规模扩大一百倍，或者题目条件稍作变化，你会怎么调整这个解法？",
];

const ANSWER_TEXT: &str = "（离线模式）好问题。目前没有连接语言模型，我没法展开回答。可以先结合题目描述和示例自己推一推，然后把思路或代码发给我。";

#[derive(Clone)]
pub struct OfflineGenerator {
  catalog: Arc<ProblemCatalog>,
}

impl OfflineGenerator {
  pub fn new(catalog: Arc<ProblemCatalog>) -> Self { Self { catalog } }

  /// The catalog problem the prompt talks about; longest title wins.
  fn problem_in(&self, prompt: &str) -> Option<&Problem> {
    self
      .catalog
      .list()
      .iter()
      .filter(|p| prompt.contains(&p.title))
      .max_by_key(|p| p.title.chars().count())
  }

  fn classify(&self, prompt: &str) -> &'static str {
    let message = section_after(prompt, "Latest message:").unwrap_or(prompt);
    let message = message.split("\n\nLabels:").next().unwrap_or(message).trim();
    let in_followup = prompt.contains("Phase: follow_up");
    if in_followup {
      return if message.is_empty() { "other" } else { "answering_followup" };
    }
    if let Some(intent) = quick_intent(message) {
      return intent.as_str();
    }
    let asks = ['?', '？', '吗', '呢'].iter().any(|c| message.ends_with(*c));
    match (asks, prompt.contains("Phase: guiding")) {
      (true, _) => "asking_question",
      (false, true) => "answering_followup",
      (false, false) => "other",
    }
  }

  fn teaching_text(&self, prompt: &str) -> String {
    let Some(p) = self.problem_in(prompt) else {
      return "（离线模式）目前没有连接语言模型，无法生成完整讲解。请配置 OPENAI_API_KEY 后再试。".into();
    };
    let mut out = format!("（离线模式）我们一起把「{}」完整过一遍。\n\n", p.display_title());
    if !p.solution_hints.is_empty() {
      out.push_str("关键思路：\n");
      for (i, h) in p.solution_hints.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, h));
      }
      out.push('\n');
    }
    if !p.expected_complexity.is_empty() {
      out.push_str(&format!("目标复杂度：{}\n\n", p.expected_complexity));
    }
    if !p.test_cases.is_empty() {
      out.push_str("用示例验证一下：\n");
      for tc in &p.test_cases {
        out.push_str(&format!("- 输入 {} → 输出 {}\n", tc.input, tc.output));
      }
      out.push('\n');
    }
    out.push_str("照着这些要点自己实现一遍，再对照示例逐个检查。");
    out
  }
}

/// Text following the last occurrence of `marker`, if any.
fn section_after<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
  prompt.rfind(marker).map(|i| &prompt[i + marker.len()..])
}

/// Reads "Hint tier N" from a guidance prompt; tier 1 when absent.
fn tier_of(prompt: &str) -> usize {
  section_after(prompt, "Hint tier ")
    .and_then(|rest| rest.chars().next())
    .and_then(|c| c.to_digit(10))
    .map(|d| (d as usize).clamp(1, 3))
    .unwrap_or(1)
}

#[async_trait]
impl TextGenerator for OfflineGenerator {
  async fn generate_text(&self, prompt: &str, system: Option<&str>) -> Result<String, GenerateError> {
    let guarded = system.map(|s| s.contains(NO_SOLUTION_RULE)).unwrap_or(true);
    debug!(target: "coach", guarded, prompt_len = prompt.len(), "Offline text generation");
    if guarded {
      Ok(ANSWER_TEXT.to_string())
    } else {
      Ok(self.teaching_text(prompt))
    }
  }

  async fn generate_structured(
    &self,
    prompt: &str,
    _system: Option<&str>,
    shape: &OutputShape,
  ) -> Result<ParsedResult, GenerateError> {
    debug!(target: "coach", shape = shape.name, prompt_len = prompt.len(), "Offline structured generation");
    let value = match shape.name {
      "intent" => json!({ "intent": self.classify(prompt) }),
      "evaluation" => json!({
        "verdict": "partially_correct",
        "rationale": "offline mode cannot judge code",
        "feedback": "（离线模式）我没法真正判断你的代码是否正确。我们换个方式：一起检查一下思路。",
      }),
      "guidance" => json!({ "hint": TIER_HINTS[tier_of(prompt) - 1] }),
      "followup" => {
        let next = FOLLOWUP_QUESTIONS
          .iter()
          .find(|q| !prompt.contains(*q))
          .copied()
          .unwrap_or(FOLLOWUP_QUESTIONS[FOLLOWUP_QUESTIONS.len() - 1]);
        json!({ "feedback": "", "question": next })
      }
      other => {
        return Err(GenerateError::Unavailable(format!("offline generator has no canned output for '{}'", other)));
      }
    };
    shape.parse(&value.to_string())
  }
}
