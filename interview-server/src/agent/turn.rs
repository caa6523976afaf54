//! Typed view of one agent turn.
//!
//! The agent signals stage completion by embedding a reserved marker in its
//! reply text, and delivers the coding question as a tool message right
//! before the reply. Both conventions are load-bearing prompt contracts, so
//! they are confined to this module: the orchestrator only ever sees a
//! parsed [`Turn`].

use tracing::warn;

use shared_types::CodingAssessment;

use super::{AgentError, AgentRun, MessageKind};

/// Reserved substring the agent embeds in its final reply of a stage.
pub const STAGE_END_MARKER: &str = "INTERVIEW_COMPLETE";

/// Prefix wrapped around submitted candidate code.
pub const SOLUTION_MARKER: &str = "CANDIDATE SOLUTION:";

/// Tool message name carrying the coding question payload.
pub const ASSESSMENT_TOOL: &str = "generate_assessment";

/// Fixed line emitted right before the coding question event.
pub const ASSESSMENT_INTRO: &str = "Here is your coding assessment question:";

/// One agent turn after parsing. `reply` has the end marker already
/// stripped; `assessment` is set when the turn carried a coding question.
#[derive(Debug, Clone)]
pub struct Turn {
    pub reply: String,
    pub ended: bool,
    pub assessment: Option<CodingAssessment>,
}

/// Strip the end marker out of a raw reply. Returns the cleaned text and
/// whether the marker was present. The only place raw agent text is
/// inspected for the completion signal.
pub fn detect_stage_end(raw: &str) -> (String, bool) {
    if raw.contains(STAGE_END_MARKER) {
        (raw.replace(STAGE_END_MARKER, "").trim().to_string(), true)
    } else {
        (raw.to_string(), false)
    }
}

/// Wrap candidate code in the submission marker the agent prompt expects.
pub fn solution_submission(code: &str) -> String {
    format!("{SOLUTION_MARKER}\n{code}\n")
}

/// Parse a raw run into a [`Turn`].
///
/// The reply is the last ai message. A tool message named
/// [`ASSESSMENT_TOOL`] immediately before the reply carries the coding
/// question as JSON; an unreadable payload downgrades to an ordinary chat
/// turn rather than failing the event.
pub fn parse_turn(run: &AgentRun) -> Result<Turn, AgentError> {
    let reply_idx = run
        .messages
        .iter()
        .rposition(|m| m.kind == MessageKind::Ai)
        .ok_or(AgentError::NoReply)?;

    let (reply, ended) = detect_stage_end(&run.messages[reply_idx].content);

    let assessment = reply_idx
        .checked_sub(1)
        .map(|i| &run.messages[i])
        .filter(|m| m.kind == MessageKind::Tool && m.name.as_deref() == Some(ASSESSMENT_TOOL))
        .and_then(|m| match serde_json::from_str::<CodingAssessment>(&m.content) {
            Ok(question) => Some(question),
            Err(e) => {
                warn!(error = %e, "unreadable coding question payload, falling back to chat");
                None
            }
        });

    Ok(Turn {
        reply,
        ended,
        assessment,
    })
}

/// Scores returned by the evaluation route on the interview thread.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewEvaluation {
    pub total_score: f64,
    pub technical_skills_score: f64,
    pub soft_skills_score: f64,
    #[serde(default)]
    pub questions: Vec<shared_types::ScoredQuestion>,
}

/// Scores returned by the evaluation route on the assessment thread.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentEvaluation {
    pub total_score: f64,
    pub evaluation: String,
}

pub fn interview_evaluation(run: &AgentRun) -> Result<InterviewEvaluation, AgentError> {
    let value = run.evaluation.clone().ok_or(AgentError::NoEvaluation)?;
    Ok(serde_json::from_value(value)?)
}

pub fn assessment_evaluation(run: &AgentRun) -> Result<AssessmentEvaluation, AgentError> {
    let value = run.evaluation.clone().ok_or(AgentError::NoEvaluation)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentMessage;

    fn run_with(messages: Vec<AgentMessage>) -> AgentRun {
        AgentRun {
            messages,
            ..AgentRun::default()
        }
    }

    #[test]
    fn test_detect_stage_end_strips_marker() {
        let (clean, ended) = detect_stage_end("Thanks for your time! INTERVIEW_COMPLETE");
        assert!(ended);
        assert_eq!(clean, "Thanks for your time!");
    }

    #[test]
    fn test_detect_stage_end_leaves_plain_text_alone() {
        let (clean, ended) = detect_stage_end("Tell me about your last project.");
        assert!(!ended);
        assert_eq!(clean, "Tell me about your last project.");
    }

    #[test]
    fn test_solution_submission_wraps_code() {
        let wrapped = solution_submission("fn main() {}");
        assert_eq!(wrapped, "CANDIDATE SOLUTION:\nfn main() {}\n");
    }

    #[test]
    fn test_parse_turn_takes_last_ai_message() {
        let run = run_with(vec![
            AgentMessage::human("opener"),
            AgentMessage::ai("First question"),
            AgentMessage::human("my answer"),
            AgentMessage::ai("Second question"),
        ]);

        let turn = parse_turn(&run).unwrap();
        assert_eq!(turn.reply, "Second question");
        assert!(!turn.ended);
        assert!(turn.assessment.is_none());
    }

    #[test]
    fn test_parse_turn_detects_completion() {
        let run = run_with(vec![
            AgentMessage::human("opener"),
            AgentMessage::ai("That's all, goodbye. INTERVIEW_COMPLETE"),
        ]);

        let turn = parse_turn(&run).unwrap();
        assert!(turn.ended);
        assert_eq!(turn.reply, "That's all, goodbye.");
    }

    #[test]
    fn test_parse_turn_extracts_coding_question() {
        let payload = r#"{"title":"Two Sum","description":"Find indices.","examples":[],"constraints":["O(n)"]}"#;
        let run = run_with(vec![
            AgentMessage::human("ready"),
            AgentMessage::tool(ASSESSMENT_TOOL, payload),
            AgentMessage::ai("Take your time."),
        ]);

        let turn = parse_turn(&run).unwrap();
        let question = turn.assessment.unwrap();
        assert_eq!(question.title, "Two Sum");
        assert_eq!(question.constraints, vec!["O(n)".to_string()]);
        assert_eq!(turn.reply, "Take your time.");
    }

    #[test]
    fn test_parse_turn_ignores_non_adjacent_tool_message() {
        let run = run_with(vec![
            AgentMessage::tool(ASSESSMENT_TOOL, r#"{"title":"t","description":"d"}"#),
            AgentMessage::human("hm"),
            AgentMessage::ai("reply"),
        ]);

        let turn = parse_turn(&run).unwrap();
        assert!(turn.assessment.is_none());
    }

    #[test]
    fn test_parse_turn_downgrades_bad_question_payload() {
        let run = run_with(vec![
            AgentMessage::tool(ASSESSMENT_TOOL, "not json at all"),
            AgentMessage::ai("chat instead"),
        ]);

        let turn = parse_turn(&run).unwrap();
        assert!(turn.assessment.is_none());
        assert_eq!(turn.reply, "chat instead");
    }

    #[test]
    fn test_parse_turn_without_reply_is_an_error() {
        let run = run_with(vec![AgentMessage::human("hello?")]);
        assert!(matches!(parse_turn(&run), Err(AgentError::NoReply)));
    }

    #[test]
    fn test_interview_evaluation_parses_camel_case() {
        let run = AgentRun {
            evaluation: Some(serde_json::json!({
                "totalScore": 78.5,
                "technicalSkillsScore": 80.0,
                "softSkillsScore": 75.0,
                "questions": [{
                    "question": "Describe a race condition.",
                    "candidateAnswer": "Two writers, no lock.",
                    "score": 80.0,
                    "evaluation": "clear"
                }]
            })),
            ..AgentRun::default()
        };

        let eval = interview_evaluation(&run).unwrap();
        assert_eq!(eval.total_score, 78.5);
        assert_eq!(eval.questions.len(), 1);
    }

    #[test]
    fn test_missing_evaluation_is_an_error() {
        let run = AgentRun::default();
        assert!(matches!(
            interview_evaluation(&run),
            Err(AgentError::NoEvaluation)
        ));
        assert!(matches!(
            assessment_evaluation(&run),
            Err(AgentError::NoEvaluation)
        ));
    }

    #[test]
    fn test_assessment_evaluation_rejects_wrong_shape() {
        let run = AgentRun {
            evaluation: Some(serde_json::json!({"grade": "A"})),
            ..AgentRun::default()
        };
        assert!(matches!(
            assessment_evaluation(&run),
            Err(AgentError::Malformed(_))
        ));
    }
}
