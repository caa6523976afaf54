use std::{
    collections::HashMap,
    sync::Arc,
    time::Instant,
};

use tokio::sync::Mutex;
use ulid::Ulid;

use shared_types::SkillLevel;

/// Identifier for one live websocket connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a session currently is in the interview flow.
///
/// The pre-start state has no variant: a connection without a session is
/// awaiting `start-interview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Interviewing,
    AssessmentPending,
    Assessing,
    Completed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Interviewing => write!(f, "interviewing"),
            Stage::AssessmentPending => write!(f, "assessment_pending"),
            Stage::Assessing => write!(f, "assessing"),
            Stage::Completed => write!(f, "completed"),
        }
    }
}

/// Profile fields copied from the durable records when the session starts.
/// Immutable for the session lifetime; used only to seed agent openers.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub candidate_name: String,
    pub role: String,
    pub company: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub skill_level: SkillLevel,
}

/// In-memory record of one candidate's in-progress interview.
///
/// Exists iff a live connection has validated an invitation and has not yet
/// disconnected or completed. Each stage gets its own agent thread; threads
/// are never reused across sessions.
#[derive(Debug, Clone)]
pub struct Session {
    pub interview_id: String,
    pub candidate_id: String,
    pub interview_thread: String,
    pub assessment_thread: Option<String>,
    pub stage: Stage,
    pub profile: CandidateProfile,
    pub started_at: Instant,
}

/// Live-session table keyed by connection id.
///
/// The only shared mutable state in the server. Each session's fields are
/// only ever touched by that connection's sequential task, so one mutex
/// around the map is all the locking there is.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ConnectionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Register a session for a connection. A second start on the same
    /// connection replaces the previous session (last start wins).
    pub async fn insert(&self, id: ConnectionId, session: Session) {
        self.sessions.lock().await.insert(id, session);
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Move a session to a new stage. Returns false if the session is gone.
    pub async fn set_stage(&self, id: &ConnectionId, stage: Stage) -> bool {
        match self.sessions.lock().await.get_mut(id) {
            Some(session) => {
                session.stage = stage;
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &ConnectionId) -> Option<Session> {
        self.sessions.lock().await.remove(id)
    }

    /// Snapshot of all live sessions for the admin endpoint.
    pub async fn snapshot(&self) -> Vec<SessionSnapshot> {
        let sessions = self.sessions.lock().await;
        let mut out = Vec::new();
        for (id, session) in sessions.iter() {
            out.push(SessionSnapshot {
                connection_id: id.to_string(),
                interview_id: session.interview_id.clone(),
                candidate_id: session.candidate_id.clone(),
                stage: session.stage.to_string(),
                age_secs: session.started_at.elapsed().as_secs(),
            });
        }
        out
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionSnapshot {
    pub connection_id: String,
    pub interview_id: String,
    pub candidate_id: String,
    pub stage: String,
    pub age_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session(stage: Stage) -> Session {
        Session {
            interview_id: "int-1".to_string(),
            candidate_id: "cand-1".to_string(),
            interview_thread: "thread-1".to_string(),
            assessment_thread: None,
            stage,
            profile: CandidateProfile {
                candidate_name: "Ada Lovelace".to_string(),
                role: "Backend Engineer".to_string(),
                company: "Acme".to_string(),
                skills: vec!["Rust".to_string()],
                experience: "5 years".to_string(),
                skill_level: SkillLevel::Medium,
            },
            started_at: Instant::now(),
        }
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        let id = ConnectionId::new();

        assert!(registry.get(&id).await.is_none());

        registry.insert(id.clone(), test_session(Stage::Interviewing)).await;
        let session = registry.get(&id).await.unwrap();
        assert_eq!(session.stage, Stage::Interviewing);

        let removed = registry.remove(&id).await.unwrap();
        assert_eq!(removed.interview_id, "int-1");
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_set_stage() {
        let registry = SessionRegistry::new();
        let id = ConnectionId::new();

        assert!(!registry.set_stage(&id, Stage::Assessing).await);

        registry.insert(id.clone(), test_session(Stage::Interviewing)).await;
        assert!(registry.set_stage(&id, Stage::AssessmentPending).await);
        assert_eq!(
            registry.get(&id).await.unwrap().stage,
            Stage::AssessmentPending
        );
    }

    #[tokio::test]
    async fn test_snapshot_reports_live_sessions() {
        let registry = SessionRegistry::new();
        let id = ConnectionId::new();
        registry.insert(id.clone(), test_session(Stage::Assessing)).await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].connection_id, id.to_string());
        assert_eq!(snapshot[0].stage, "assessing");
    }
}
