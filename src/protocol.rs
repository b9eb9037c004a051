//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::ProblemChoice;
use crate::domain::{Difficulty, Problem, TestCase};
use crate::session::{PhaseKind, SessionStatus};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListProblems {
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    /// No title means "pick one at random" (optionally within a difficulty).
    SelectProblem {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    Message {
        text: String,
    },
    Status,
    /// Drop the current session and start a fresh one.
    Reset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Problems {
        problems: Vec<ProblemSummary>,
    },
    CoachReply {
        text: String,
        phase: PhaseKind,
    },
    Status {
        status: SessionStatus,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ServerWsMessage {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        ServerWsMessage::Error { kind: kind.to_string(), message: message.into() }
    }
}

pub fn choice_from(title: Option<String>, difficulty: Option<Difficulty>) -> ProblemChoice {
    match title.filter(|t| !t.trim().is_empty()) {
        Some(t) => ProblemChoice::Title(t),
        None => ProblemChoice::Random { difficulty },
    }
}

/// List entry. Enough to render a picker.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemSummary {
    pub title: String,
    pub title_en: Option<String>,
    pub difficulty: Difficulty,
    pub expected_complexity: String,
}

/// Full problem statement. Coach-only notes are not exposed.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemOut {
    pub title: String,
    pub title_en: Option<String>,
    pub description: String,
    pub difficulty: Difficulty,
    pub expected_complexity: String,
    pub test_cases: Vec<TestCase>,
}

pub fn to_summary(p: &Problem) -> ProblemSummary {
    ProblemSummary {
        title: p.title.clone(),
        title_en: p.title_en.clone(),
        difficulty: p.difficulty,
        expected_complexity: p.expected_complexity.clone(),
    }
}

pub fn to_out(p: &Problem) -> ProblemOut {
    ProblemOut {
        title: p.title.clone(),
        title_en: p.title_en.clone(),
        description: p.description.clone(),
        difficulty: p.difficulty,
        expected_complexity: p.expected_complexity.clone(),
        test_cases: p.test_cases.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ProblemsQuery {
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Deserialize)]
pub struct ProblemQuery {
    pub title: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"select_problem","title":"两数之和"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::SelectProblem { title: Some(ref t), difficulty: None } if t == "两数之和"));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"list_problems","difficulty":"medium"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::ListProblems { difficulty: Some(Difficulty::Medium) }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"message","text":"hi"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Message { .. }));
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"reset"}"#).is_ok());
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"dance"}"#).is_err());
    }

    #[test]
    fn server_messages_are_type_tagged() {
        let v = serde_json::to_value(ServerWsMessage::CoachReply { text: "hi".into(), phase: PhaseKind::FollowUp }).unwrap();
        assert_eq!(v["type"], "coach_reply");
        assert_eq!(v["phase"], "follow_up");
        let v = serde_json::to_value(ServerWsMessage::error("generation_error", "boom")).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["kind"], "generation_error");
    }

    #[test]
    fn blank_title_means_random() {
        assert_eq!(choice_from(Some("  ".into()), Some(Difficulty::Easy)), ProblemChoice::Random { difficulty: Some(Difficulty::Easy) });
        assert_eq!(choice_from(Some("爬楼梯".into()), None), ProblemChoice::Title("爬楼梯".into()));
    }

    #[test]
    fn problem_out_hides_coach_notes() {
        let p = crate::seeds::seed_problems().remove(0);
        let v = serde_json::to_value(to_out(&p)).unwrap();
        assert!(v.get("solution_hints").is_none());
        assert_eq!(v["difficulty"], "easy");
    }
}
