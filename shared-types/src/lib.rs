//! Shared types between the interview server and frontend clients.
//!
//! Everything that crosses the websocket or is stored as a result block
//! lives here, so the candidate UI and the server agree on one shape.
//! Serializable with serde for JSON over WebSocket/HTTP; exported to
//! TypeScript with ts-rs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Lifecycle enums
// ============================================================================

/// Lifecycle of one candidate's participation in one interview.
///
/// `invited → started → completed`; `disqualified` is set by the recruiting
/// side, never by the interview server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InterviewStatus {
    Invited,
    Started,
    Completed,
    Disqualified,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Invited => "invited",
            InterviewStatus::Started => "started",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Disqualified => "disqualified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invited" => Some(InterviewStatus::Invited),
            "started" => Some(InterviewStatus::Started),
            "completed" => Some(InterviewStatus::Completed),
            "disqualified" => Some(InterviewStatus::Disqualified),
            _ => None,
        }
    }
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty of the coding assessment, chosen at invitation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SkillLevel {
    Easy,
    Medium,
    Hard,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Easy => "easy",
            SkillLevel::Medium => "medium",
            SkillLevel::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(SkillLevel::Easy),
            "medium" => Some(SkillLevel::Medium),
            "hard" => Some(SkillLevel::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transcripts
// ============================================================================

/// Speaker tag in a normalized transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub enum TranscriptRole {
    Interviewer,
    Candidate,
}

/// One normalized transcript line. Derived from the raw agent message log,
/// never stored raw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
}

// ============================================================================
// Result blocks
// ============================================================================

/// Per-question scoring detail inside an interview evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScoredQuestion {
    pub question: String,
    pub candidate_answer: String,
    pub score: f64,
    pub evaluation: String,
}

/// Result block for the conversational interview stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TechnicalInterview {
    pub total_score: f64,
    pub technical_skills_score: f64,
    pub soft_skills_score: f64,
    #[serde(default)]
    pub questions: Vec<ScoredQuestion>,
    pub transcript: Vec<TranscriptEntry>,
}

/// Worked example attached to a coding question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct AssessmentExample {
    pub input: String,
    pub output: String,
    pub explanation: String,
}

/// A coding question as produced by the assessment agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct CodingAssessment {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<AssessmentExample>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// Result block for the coding assessment stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TechnicalAssessment {
    pub total_score: f64,
    pub question: CodingAssessment,
    pub solution: String,
    pub evaluation: String,
    pub transcript: Vec<TranscriptEntry>,
}

// ============================================================================
// WebSocket protocol
// ============================================================================

/// Client → Server events over the interview websocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[ts(export)]
pub enum ClientEvent {
    /// Open a session against an invitation.
    StartInterview {
        #[serde(rename = "invitationToken")]
        invitation_token: String,
    },

    /// Candidate chat turn during the interview stage.
    InterviewResponse { message: String },

    /// Candidate is ready for the coding assessment.
    StartAssessment,

    /// Candidate chat turn during the assessment stage.
    AssessmentResponse { message: String },

    /// Candidate submits code for the coding question.
    SubmitSolution { solution: String },
}

/// Server → Client events over the interview websocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", rename_all = "kebab-case")]
#[ts(export)]
pub enum ServerEvent {
    /// Interviewer chat line during the interview stage.
    InterviewMessage { message: String },

    /// Interviewer chat line during the assessment stage.
    AssessmentMessage { message: String },

    /// The coding question, decoupled from ordinary chat.
    Assessment { assessment: CodingAssessment },

    /// Interview stage finished; an assessment stage follows.
    AssessmentTransition,

    /// Terminal stage finished; the session is over.
    InterviewEnd,

    /// Anything went wrong; human-readable message only.
    Error { message: String },
}

// ============================================================================
// Tests
// ============================================================================
