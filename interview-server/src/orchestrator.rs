//! Stage controller for live interview sessions.
//!
//! Each public method maps to one inbound client event and returns the
//! ordered list of server events to send back. Methods never touch the
//! socket; the websocket handler owns delivery. All session mutation goes
//! through the injected [`SessionRegistry`], so the controller itself holds
//! no per-connection state and can be driven directly from tests.

use std::sync::Arc;

use tracing::{error, info};

use shared_types::{InterviewStatus, ServerEvent, TechnicalAssessment, TechnicalInterview};

use crate::agent::turn::{self, Turn};
use crate::agent::{AgentError, RunInput, SharedAgentGateway};
use crate::session::{CandidateProfile, ConnectionId, Session, SessionRegistry, Stage};
use crate::store::{InterviewStore, StoreError};
use crate::transcript::extract_transcript;

/// Failures surfaced to the client. `Display` is the exact message sent in
/// the wire-level error event, so keep these stable.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Invalid session")]
    InvalidSession,
    #[error("Invalid invitation token")]
    InvalidInvitation,
    #[error("Interview already completed")]
    AlreadyCompleted,
    #[error("Interview agent unavailable")]
    Agent(#[from] AgentError),
    #[error("Interview storage unavailable")]
    Persistence(#[from] StoreError),
}

pub struct StageController {
    store: InterviewStore,
    agent: SharedAgentGateway,
    sessions: Arc<SessionRegistry>,
    interview_assistant: String,
    assessment_assistant: String,
}

impl StageController {
    pub fn new(
        store: InterviewStore,
        agent: SharedAgentGateway,
        sessions: Arc<SessionRegistry>,
        interview_assistant: String,
        assessment_assistant: String,
    ) -> Self {
        Self {
            store,
            agent,
            sessions,
            interview_assistant,
            assessment_assistant,
        }
    }

    /// Validate the invitation, open agent threads, and run the interview
    /// opener. A second start on the same connection replaces the previous
    /// session.
    pub async fn start_interview(
        &self,
        conn: &ConnectionId,
        token: &str,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let claims = self
            .store
            .validate_invitation_token(token)
            .await?
            .ok_or(OrchestratorError::InvalidInvitation)?;

        match claims.status {
            InterviewStatus::Completed => return Err(OrchestratorError::AlreadyCompleted),
            // A disqualified invite is no longer usable.
            InterviewStatus::Disqualified => return Err(OrchestratorError::InvalidInvitation),
            InterviewStatus::Invited | InterviewStatus::Started => {}
        }

        let interview_thread = self.agent.create_thread().await?;
        let assessment_thread = if claims.include_technical_assessment {
            Some(self.agent.create_thread().await?)
        } else {
            None
        };

        self.store
            .update_status(
                &claims.interview_id,
                &claims.candidate_id,
                InterviewStatus::Started,
            )
            .await?;

        let opener = interview_opener(&claims.profile);
        let run = self
            .agent
            .run(
                &interview_thread,
                &self.interview_assistant,
                RunInput::chat(opener),
            )
            .await?;
        let turn = turn::parse_turn(&run)?;

        info!(
            connection = %conn,
            interview_id = %claims.interview_id,
            candidate_id = %claims.candidate_id,
            "interview session started"
        );
        self.sessions
            .insert(
                conn.clone(),
                Session {
                    interview_id: claims.interview_id,
                    candidate_id: claims.candidate_id,
                    interview_thread,
                    assessment_thread,
                    stage: Stage::Interviewing,
                    profile: claims.profile,
                    started_at: std::time::Instant::now(),
                },
            )
            .await;

        let mut events = Vec::new();
        if !turn.reply.is_empty() {
            events.push(ServerEvent::InterviewMessage {
                message: turn.reply.clone(),
            });
        }
        if turn.ended {
            events.extend(self.complete_interview(conn).await?);
        }
        Ok(events)
    }

    /// Relay one candidate answer during the interview stage.
    pub async fn interview_response(
        &self,
        conn: &ConnectionId,
        message: String,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let session = self
            .sessions
            .get(conn)
            .await
            .ok_or(OrchestratorError::InvalidSession)?;
        if session.stage != Stage::Interviewing {
            return Err(OrchestratorError::InvalidSession);
        }

        let run = self
            .agent
            .run(
                &session.interview_thread,
                &self.interview_assistant,
                RunInput::chat(message),
            )
            .await?;
        let turn = turn::parse_turn(&run)?;

        let mut events = Vec::new();
        if !turn.reply.is_empty() {
            events.push(ServerEvent::InterviewMessage {
                message: turn.reply.clone(),
            });
        }
        if turn.ended {
            events.extend(self.complete_interview(conn).await?);
        }
        Ok(events)
    }

    /// Kick off the coding-assessment stage after the client acknowledged
    /// the transition. The stage only advances once the opener run succeeds,
    /// so a failed start leaves the session pending and retryable.
    pub async fn start_assessment(
        &self,
        conn: &ConnectionId,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let session = self
            .sessions
            .get(conn)
            .await
            .ok_or(OrchestratorError::InvalidSession)?;
        if session.stage != Stage::AssessmentPending {
            return Err(OrchestratorError::InvalidSession);
        }
        let thread = session
            .assessment_thread
            .as_deref()
            .ok_or(OrchestratorError::InvalidSession)?;

        let opener = assessment_opener(&session.profile);
        let run = self
            .agent
            .run(thread, &self.assessment_assistant, RunInput::chat(opener))
            .await?;
        let turn = turn::parse_turn(&run)?;

        self.sessions.set_stage(conn, Stage::Assessing).await;
        info!(
            connection = %conn,
            interview_id = %session.interview_id,
            "assessment stage started"
        );

        let mut events = assessment_events(&turn);
        if turn.ended {
            events.extend(self.complete_assessment(conn).await?);
        }
        Ok(events)
    }

    /// Relay one candidate message during the assessment stage.
    pub async fn assessment_response(
        &self,
        conn: &ConnectionId,
        message: String,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        self.assessment_turn(conn, message).await
    }

    /// Submit candidate code. The solution text is wrapped with a reserved
    /// prefix so the agent can tell code apart from chat.
    pub async fn submit_solution(
        &self,
        conn: &ConnectionId,
        solution: &str,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        self.assessment_turn(conn, turn::solution_submission(solution))
            .await
    }

    /// Drop the connection's session, if any. In-flight work is unaffected:
    /// the per-connection task is sequential, so this only ever runs between
    /// turns.
    pub async fn disconnect(&self, conn: &ConnectionId) {
        if let Some(session) = self.sessions.remove(conn).await {
            info!(
                connection = %conn,
                interview_id = %session.interview_id,
                stage = %session.stage,
                "session closed on disconnect"
            );
        }
    }

    async fn assessment_turn(
        &self,
        conn: &ConnectionId,
        message: String,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let session = self
            .sessions
            .get(conn)
            .await
            .ok_or(OrchestratorError::InvalidSession)?;
        if session.stage != Stage::Assessing {
            return Err(OrchestratorError::InvalidSession);
        }
        let thread = session
            .assessment_thread
            .as_deref()
            .ok_or(OrchestratorError::InvalidSession)?;

        let run = self
            .agent
            .run(thread, &self.assessment_assistant, RunInput::chat(message))
            .await?;
        let turn = turn::parse_turn(&run)?;

        let mut events = assessment_events(&turn);
        if turn.ended {
            events.extend(self.complete_assessment(conn).await?);
        }
        Ok(events)
    }

    /// Evaluate the interview stage and persist its results, then either
    /// hand over to the assessment or finish the session. A persistence
    /// failure is logged and never blocks the completion events; the status
    /// flip rides in the same update as the result block, so a failed save
    /// leaves the durable record retryable.
    async fn complete_interview(
        &self,
        conn: &ConnectionId,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let session = self
            .sessions
            .get(conn)
            .await
            .ok_or(OrchestratorError::InvalidSession)?;

        let run = self
            .agent
            .run(
                &session.interview_thread,
                &self.interview_assistant,
                RunInput::evaluate(),
            )
            .await?;
        let evaluation = turn::interview_evaluation(&run)?;

        let results = TechnicalInterview {
            total_score: evaluation.total_score,
            technical_skills_score: evaluation.technical_skills_score,
            soft_skills_score: evaluation.soft_skills_score,
            questions: evaluation.questions,
            transcript: extract_transcript(&run.messages),
        };

        let assessment_next = session.assessment_thread.is_some();
        if let Err(e) = self
            .store
            .save_interview_results(
                &session.interview_id,
                &session.candidate_id,
                &results,
                !assessment_next,
            )
            .await
        {
            error!(
                interview_id = %session.interview_id,
                candidate_id = %session.candidate_id,
                "failed to persist interview results: {e}"
            );
        }

        if assessment_next {
            self.sessions.set_stage(conn, Stage::AssessmentPending).await;
            info!(interview_id = %session.interview_id, "interview stage complete, assessment pending");
            Ok(vec![ServerEvent::AssessmentTransition])
        } else {
            self.sessions.remove(conn).await;
            info!(interview_id = %session.interview_id, "interview complete");
            Ok(vec![ServerEvent::InterviewEnd])
        }
    }

    /// Evaluate the assessment stage, persist its results, and finish the
    /// session. Same persistence contract as the interview stage.
    async fn complete_assessment(
        &self,
        conn: &ConnectionId,
    ) -> Result<Vec<ServerEvent>, OrchestratorError> {
        let session = self
            .sessions
            .get(conn)
            .await
            .ok_or(OrchestratorError::InvalidSession)?;
        let thread = session
            .assessment_thread
            .as_deref()
            .ok_or(OrchestratorError::InvalidSession)?;

        let run = self
            .agent
            .run(thread, &self.assessment_assistant, RunInput::evaluate())
            .await?;
        let evaluation = turn::assessment_evaluation(&run)?;

        let results = TechnicalAssessment {
            total_score: evaluation.total_score,
            question: run.coding_assessment.clone().unwrap_or_default(),
            solution: run.solution.clone().unwrap_or_default(),
            evaluation: evaluation.evaluation,
            transcript: extract_transcript(&run.messages),
        };

        if let Err(e) = self
            .store
            .save_assessment_results(&session.interview_id, &session.candidate_id, &results)
            .await
        {
            error!(
                interview_id = %session.interview_id,
                candidate_id = %session.candidate_id,
                "failed to persist assessment results: {e}"
            );
        }

        self.sessions.remove(conn).await;
        info!(interview_id = %session.interview_id, "assessment complete");
        Ok(vec![ServerEvent::InterviewEnd])
    }
}

/// Events for one assessment-stage turn. A generated coding question
/// replaces the raw reply text with a fixed intro line plus the structured
/// question.
fn assessment_events(turn: &Turn) -> Vec<ServerEvent> {
    if let Some(question) = &turn.assessment {
        vec![
            ServerEvent::AssessmentMessage {
                message: turn::ASSESSMENT_INTRO.to_string(),
            },
            ServerEvent::Assessment {
                assessment: question.clone(),
            },
        ]
    } else if !turn.reply.is_empty() {
        vec![ServerEvent::AssessmentMessage {
            message: turn.reply.clone(),
        }]
    } else {
        Vec::new()
    }
}

/// First message on the interview thread, spoken as the candidate so the
/// agent opens with a tailored question.
fn interview_opener(profile: &CandidateProfile) -> String {
    format!(
        "Hi! I'm {}. I'm interviewing for the {} position at {}. \
         My key skills are: {}. My experience: {}.",
        profile.candidate_name,
        profile.role,
        profile.company,
        profile.skills.join(", "),
        profile.experience,
    )
}

fn assessment_opener(profile: &CandidateProfile) -> String {
    format!(
        "Hi, I'm {}. I'm ready for my coding assessment. Difficulty level: {}.",
        profile.candidate_name,
        profile.skill_level.as_str(),
    )
}
