//! Durable candidate-interview records.
//!
//! The orchestrator touches exactly three things here: the lifecycle status,
//! and the two stage result blocks. Result writes are idempotent updates
//! keyed by `(interview_id, candidate_id)`, so a duplicated completion never
//! double-writes.

use sqlx::SqlitePool;

use shared_types::{InterviewStatus, SkillLevel, TechnicalAssessment, TechnicalInterview};

use crate::session::CandidateProfile;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid stored json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid column value: {0}")]
    Decode(String),
    #[error("no candidate interview for ({interview_id}, {candidate_id})")]
    MissingRecord {
        interview_id: String,
        candidate_id: String,
    },
}

/// Row data needed to seed an invitation. Issued by the recruiting side in
/// production; tests and dev environments insert these directly.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub interview_id: String,
    pub candidate_id: String,
    pub invitation_token: String,
    pub candidate_name: String,
    pub role: String,
    pub company: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub skill_level: SkillLevel,
    pub include_technical_assessment: bool,
}

/// What a valid invitation token resolves to.
#[derive(Debug, Clone)]
pub struct InvitationClaims {
    pub interview_id: String,
    pub candidate_id: String,
    pub status: InterviewStatus,
    pub include_technical_assessment: bool,
    pub profile: CandidateProfile,
}

/// Durable state read back for verification and reporting.
#[derive(Debug, Clone)]
pub struct CandidateInterviewRecord {
    pub status: InterviewStatus,
    pub technical_interview: Option<TechnicalInterview>,
    pub technical_assessment: Option<TechnicalAssessment>,
}

#[derive(Clone)]
pub struct InterviewStore {
    pool: SqlitePool,
}

impl InterviewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a fresh invitation row with status `invited`.
    pub async fn create_invitation(&self, invitation: &NewInvitation) -> Result<(), StoreError> {
        let skills = serde_json::to_string(&invitation.skills)?;
        sqlx::query(
            "INSERT INTO candidate_interviews
                (interview_id, candidate_id, invitation_token, status,
                 candidate_name, role, company, skills, experience,
                 skill_level, include_technical_assessment)
             VALUES (?, ?, ?, 'invited', ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&invitation.interview_id)
        .bind(&invitation.candidate_id)
        .bind(&invitation.invitation_token)
        .bind(&invitation.candidate_name)
        .bind(&invitation.role)
        .bind(&invitation.company)
        .bind(&skills)
        .bind(&invitation.experience)
        .bind(invitation.skill_level.as_str())
        .bind(invitation.include_technical_assessment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Resolve an invitation token to its claims, or None if unknown.
    pub async fn validate_invitation_token(
        &self,
        token: &str,
    ) -> Result<Option<InvitationClaims>, StoreError> {
        let row: Option<(
            String,
            String,
            String,
            bool,
            String,
            String,
            String,
            String,
            String,
            String,
        )> = sqlx::query_as(
            "SELECT interview_id, candidate_id, status, include_technical_assessment,
                    candidate_name, role, company, skills, experience, skill_level
             FROM candidate_interviews WHERE invitation_token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some((
            interview_id,
            candidate_id,
            status,
            include_technical_assessment,
            candidate_name,
            role,
            company,
            skills,
            experience,
            skill_level,
        )) = row
        else {
            return Ok(None);
        };

        let status = InterviewStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("unknown status '{status}'")))?;
        let skill_level = SkillLevel::parse(&skill_level)
            .ok_or_else(|| StoreError::Decode(format!("unknown skill level '{skill_level}'")))?;
        let skills: Vec<String> = serde_json::from_str(&skills)?;

        Ok(Some(InvitationClaims {
            interview_id,
            candidate_id,
            status,
            include_technical_assessment,
            profile: CandidateProfile {
                candidate_name,
                role,
                company,
                skills,
                experience,
                skill_level,
            },
        }))
    }

    pub async fn update_status(
        &self,
        interview_id: &str,
        candidate_id: &str,
        status: InterviewStatus,
    ) -> Result<(), StoreError> {
        let rows = sqlx::query(
            "UPDATE candidate_interviews
             SET status = ?, updated_at = datetime('now')
             WHERE interview_id = ? AND candidate_id = ?",
        )
        .bind(status.as_str())
        .bind(interview_id)
        .bind(candidate_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::MissingRecord {
                interview_id: interview_id.to_string(),
                candidate_id: candidate_id.to_string(),
            });
        }
        Ok(())
    }

    /// Write the interview-stage result block. When `complete` is set the
    /// same update also flips the status, so the block and the lifecycle
    /// move together or not at all.
    pub async fn save_interview_results(
        &self,
        interview_id: &str,
        candidate_id: &str,
        results: &TechnicalInterview,
        complete: bool,
    ) -> Result<(), StoreError> {
        let results = serde_json::to_string(results)?;
        let query = if complete {
            "UPDATE candidate_interviews
             SET technical_interview = ?, status = 'completed', updated_at = datetime('now')
             WHERE interview_id = ? AND candidate_id = ?"
        } else {
            "UPDATE candidate_interviews
             SET technical_interview = ?, updated_at = datetime('now')
             WHERE interview_id = ? AND candidate_id = ?"
        };

        let rows = sqlx::query(query)
            .bind(&results)
            .bind(interview_id)
            .bind(candidate_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(StoreError::MissingRecord {
                interview_id: interview_id.to_string(),
                candidate_id: candidate_id.to_string(),
            });
        }
        Ok(())
    }

    /// Write the assessment-stage result block. The assessment is always the
    /// terminal stage, so this also completes the record.
    pub async fn save_assessment_results(
        &self,
        interview_id: &str,
        candidate_id: &str,
        results: &TechnicalAssessment,
    ) -> Result<(), StoreError> {
        let results = serde_json::to_string(results)?;
        let rows = sqlx::query(
            "UPDATE candidate_interviews
             SET technical_assessment = ?, status = 'completed', updated_at = datetime('now')
             WHERE interview_id = ? AND candidate_id = ?",
        )
        .bind(&results)
        .bind(interview_id)
        .bind(candidate_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::MissingRecord {
                interview_id: interview_id.to_string(),
                candidate_id: candidate_id.to_string(),
            });
        }
        Ok(())
    }

    /// Read a record back. Used by tests and the reporting side.
    pub async fn fetch(
        &self,
        interview_id: &str,
        candidate_id: &str,
    ) -> Result<Option<CandidateInterviewRecord>, StoreError> {
        let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT status, technical_interview, technical_assessment
             FROM candidate_interviews
             WHERE interview_id = ? AND candidate_id = ?",
        )
        .bind(interview_id)
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((status, interview_json, assessment_json)) = row else {
            return Ok(None);
        };

        let status = InterviewStatus::parse(&status)
            .ok_or_else(|| StoreError::Decode(format!("unknown status '{status}'")))?;
        let technical_interview = interview_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?;
        let technical_assessment = assessment_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?;

        Ok(Some(CandidateInterviewRecord {
            status,
            technical_interview,
            technical_assessment,
        }))
    }
}
