//! Normalized transcripts from raw agent message logs.

use shared_types::{TranscriptEntry, TranscriptRole};

use crate::agent::turn::{SOLUTION_MARKER, STAGE_END_MARKER};
use crate::agent::{AgentMessage, MessageKind};

/// Reduce a thread's raw message log to the lines a human actually said.
///
/// The first message is the synthetic opener and is dropped, as are tool
/// messages, messages carrying tool invocations, and empty assistant turns.
/// Control markers never survive into the transcript.
pub fn extract_transcript(messages: &[AgentMessage]) -> Vec<TranscriptEntry> {
    messages
        .iter()
        .skip(1)
        .filter(|m| m.kind != MessageKind::Tool)
        .filter(|m| m.tool_calls.is_empty())
        .filter(|m| !(m.kind == MessageKind::Ai && m.content.is_empty()))
        .map(|m| {
            let role = match m.kind {
                MessageKind::Human => TranscriptRole::Candidate,
                _ => TranscriptRole::Interviewer,
            };
            let content = m
                .content
                .replace(STAGE_END_MARKER, "")
                .replace(SOLUTION_MARKER, "")
                .trim()
                .to_string();
            TranscriptEntry { role, content }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::turn::ASSESSMENT_TOOL;

    fn raw_log() -> Vec<AgentMessage> {
        vec![
            AgentMessage::human("synthetic opener, never shown"),
            AgentMessage::ai("Welcome! Tell me about yourself."),
            AgentMessage::human("I build backend services."),
            AgentMessage {
                tool_calls: vec![serde_json::json!({"name": ASSESSMENT_TOOL})],
                ..AgentMessage::ai("let me grab a question")
            },
            AgentMessage::tool(ASSESSMENT_TOOL, "{\"title\":\"t\"}"),
            AgentMessage::ai(""),
            AgentMessage::human("CANDIDATE SOLUTION:\nfn main() {}"),
            AgentMessage::ai("Great, thanks for your time! INTERVIEW_COMPLETE"),
        ]
    }

    #[test]
    fn test_extract_drops_opener_tools_and_empty_ai_turns() {
        let transcript = extract_transcript(&raw_log());

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].role, TranscriptRole::Interviewer);
        assert_eq!(transcript[0].content, "Welcome! Tell me about yourself.");
        assert_eq!(transcript[1].role, TranscriptRole::Candidate);
        assert_eq!(transcript[2].content, "fn main() {}");
        assert_eq!(transcript[3].content, "Great, thanks for your time!");
    }

    #[test]
    fn test_extract_strips_every_marker() {
        let transcript = extract_transcript(&raw_log());
        for entry in &transcript {
            assert!(!entry.content.contains(STAGE_END_MARKER));
            assert!(!entry.content.contains(SOLUTION_MARKER));
        }
    }

    #[test]
    fn test_extract_is_deterministic_and_order_preserving() {
        let log = raw_log();
        let first = extract_transcript(&log);
        let second = extract_transcript(&log);
        assert_eq!(first, second);

        let roles: Vec<_> = first.iter().map(|e| e.role).collect();
        assert_eq!(
            roles,
            vec![
                TranscriptRole::Interviewer,
                TranscriptRole::Candidate,
                TranscriptRole::Candidate,
                TranscriptRole::Interviewer,
            ]
        );
    }

    #[test]
    fn test_extract_keeps_empty_candidate_turns() {
        let log = vec![
            AgentMessage::human("opener"),
            AgentMessage::human(""),
            AgentMessage::ai("Still with me?"),
        ];
        let transcript = extract_transcript(&log);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, TranscriptRole::Candidate);
        assert_eq!(transcript[0].content, "");
    }
}
