//! vera-server: the API binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vera_core::agents::research::ResearchAgent;
use vera_core::api::routes::{router, AppState};
use vera_core::config::Config;
use vera_core::error::{Error, Result};
use vera_core::llm::{ClientConfig, GeminiClient};
use vera_core::storage::store::SqliteStore;
use vera_core::synthesis::AnswerSynthesizer;
use vera_core::verification::claims::ClaimExtractor;
use vera_core::verification::verifier::VerificationEngine;
use vera_core::web::environment::WebEnvironment;
use vera_core::web::fetch::HttpFetcher;
use vera_core::web::search::GoogleSearch;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is a dev convenience; absence is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(SqliteStore::open(config.sqlite_path()?)?);

    let llm = Arc::new(GeminiClient::new(ClientConfig::new(
        config.gemini_api_key.clone(),
    ))?);

    let web_env = Arc::new(WebEnvironment::new(
        Arc::new(GoogleSearch::new(config.search.clone())?),
        Arc::new(HttpFetcher::new()?),
    ));

    let researcher = Arc::new(ResearchAgent::new(
        web_env,
        ClaimExtractor::new(llm.clone()),
        VerificationEngine::new(llm.clone()),
        AnswerSynthesizer::new(llm),
    ));

    let state = Arc::new(AppState {
        store,
        researcher,
        trace_token: config.trace_token.clone(),
        max_attempts: 3,
    });

    let app = router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| Error::config(format!("failed to bind {}: {}", config.bind_addr, e)))?;

    tracing::info!(addr = %config.bind_addr, "vera-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler");
    }
}
