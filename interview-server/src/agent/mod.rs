//! Client for the conversation agent service.
//!
//! The agent service owns all conversational state: the server creates one
//! thread per stage, then drives it turn by turn. This module owns the wire
//! shapes and the HTTP transport so the orchestrator never touches raw JSON.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod mock;
pub mod turn;

pub type SharedAgentGateway = Arc<dyn AgentGateway>;

/// Role tag on a message coming back from the agent service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
    Tool,
}

/// One message in a thread's raw log, as returned by the agent service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
}

impl AgentMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Human,
            name: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Ai,
            name: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Tool,
            name: Some(name.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Outbound turn payload. Either one human chat message or the evaluation
/// route, never both.
#[derive(Debug, Clone, Serialize)]
pub struct RunInput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<TurnMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnMessage {
    pub role: &'static str,
    pub content: String,
}

impl RunInput {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            messages: vec![TurnMessage {
                role: "human",
                content: text.into(),
            }],
            route: None,
        }
    }

    pub fn evaluate() -> Self {
        Self {
            messages: Vec::new(),
            route: Some("evaluate"),
        }
    }
}

/// Everything one finished agent turn gives back. `evaluation`,
/// `coding_assessment` and `solution` only appear on evaluation runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRun {
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
    #[serde(default)]
    pub evaluation: Option<serde_json::Value>,
    #[serde(default)]
    pub coding_assessment: Option<shared_types::CodingAssessment>,
    #[serde(default)]
    pub solution: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("agent returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("agent response malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("agent run produced no reply")]
    NoReply,
    #[error("agent run produced no evaluation")]
    NoEvaluation,
}

/// Seam between the orchestrator and the agent service. One full agent turn
/// per call; the call suspends until the agent finishes, including any
/// internal tool use.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn create_thread(&self) -> Result<String, AgentError>;

    async fn run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        input: RunInput,
    ) -> Result<AgentRun, AgentError>;
}

#[derive(Debug, Deserialize)]
struct ThreadCreated {
    thread_id: String,
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    assistant_id: &'a str,
    input: RunInput,
}

/// HTTP implementation against the real agent service.
pub struct HttpAgentGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentGateway {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn create_thread(&self) -> Result<String, AgentError> {
        let res = self
            .post("/threads")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(AgentError::Status(res.status()));
        }
        let created: ThreadCreated = res.json().await?;
        debug!(thread_id = %created.thread_id, "agent thread created");
        Ok(created.thread_id)
    }

    async fn run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        input: RunInput,
    ) -> Result<AgentRun, AgentError> {
        debug!(thread_id, assistant_id, route = ?input.route, "agent run");
        let res = self
            .post(&format!("/threads/{thread_id}/runs/wait"))
            .json(&RunRequest {
                assistant_id,
                input,
            })
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(AgentError::Status(res.status()));
        }
        Ok(res.json::<AgentRun>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_input_serializes_one_human_message() {
        let input = RunInput::chat("Hello there");
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["messages"][0]["role"], "human");
        assert_eq!(json["messages"][0]["content"], "Hello there");
        assert!(json.get("route").is_none());
    }

    #[test]
    fn test_evaluate_input_serializes_route_only() {
        let json = serde_json::to_value(&RunInput::evaluate()).unwrap();
        assert_eq!(json["route"], "evaluate");
        assert!(json.get("messages").is_none());
    }

    #[test]
    fn test_agent_run_tolerates_sparse_payloads() {
        let run: AgentRun = serde_json::from_str(
            r#"{"messages":[{"content":"hi","type":"ai"},{"content":"{}","type":"tool","name":"generate_assessment"}]}"#,
        )
        .unwrap();

        assert_eq!(run.messages.len(), 2);
        assert_eq!(run.messages[0].kind, MessageKind::Ai);
        assert_eq!(run.messages[1].kind, MessageKind::Tool);
        assert_eq!(run.messages[1].name.as_deref(), Some("generate_assessment"));
        assert!(run.evaluation.is_none());
        assert!(run.coding_assessment.is_none());
    }
}
