use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_server::agent::HttpAgentGateway;
use interview_server::api;
use interview_server::config::Config;
use interview_server::db;
use interview_server::orchestrator::StageController;
use interview_server::session::SessionRegistry;
use interview_server::state::AppState;
use interview_server::store::InterviewStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(port = config.port, "interview server starting");

    // Database
    let db = db::connect(&config.database_url).await?;

    // Conversation agent client
    let agent = HttpAgentGateway::new(
        &config.agent_base_url,
        config.agent_api_key.clone(),
        config.agent_timeout,
    )?;

    let sessions = SessionRegistry::new();
    let controller = Arc::new(StageController::new(
        InterviewStore::new(db),
        Arc::new(agent),
        Arc::clone(&sessions),
        config.interview_assistant.clone(),
        config.assessment_assistant.clone(),
    ));

    let state = Arc::new(AppState {
        sessions,
        controller,
    });

    // CORS for the candidate-facing frontend
    let allowed_origins = config
        .allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("invalid allowed origin: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    let app = api::router()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
