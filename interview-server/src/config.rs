use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the interview server listens on
    pub port: u16,
    /// Path to the interview SQLite database
    pub database_url: String,
    /// Base URL of the conversation agent service
    pub agent_base_url: String,
    /// Optional API key sent to the agent service as `x-api-key`
    pub agent_api_key: Option<String>,
    /// Upper bound for one agent turn, including its internal tool use
    pub agent_timeout: Duration,
    /// Assistant that runs the conversational interview stage
    pub interview_assistant: String,
    /// Assistant that runs the coding assessment stage
    pub assessment_assistant: String,
    /// Frontend origins allowed through CORS
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env_parse("PORT", 3000)?,
            database_url: env_str("DATABASE_URL", "sqlite:./data/recruitmind.db"),
            agent_base_url: env_str("AGENT_BASE_URL", "http://127.0.0.1:2024"),
            agent_api_key: std::env::var("AGENT_API_KEY").ok(),
            agent_timeout: Duration::from_secs(env_parse("AGENT_TIMEOUT_SECS", 120)?),
            interview_assistant: env_str("INTERVIEW_ASSISTANT_ID", "technical_interview"),
            assessment_assistant: env_str("ASSESSMENT_ASSISTANT_ID", "technical_assessment"),
            allowed_origins: env_csv(
                "ALLOWED_ORIGINS",
                &["http://localhost:5173", "http://localhost:3000"],
            ),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_csv(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(_) => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
