mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::DocumentExtractor;
use crate::llm_client::LlmClient;
use crate::ranking::pipeline::{RankOptions, Ranker};
use crate::ranking::scoring::{CandidateScorer, HeuristicScorer, LlmScorer};
use crate::ranking::vectorizer::{SemanticEmbedder, Vectorizer, VectorizerKind};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ranker API v{}", env!("CARGO_PKG_VERSION"));

    // Similarity strategy. The embedding model loads lazily on first use.
    let vectorizer = match config.vectorizer {
        VectorizerKind::Lexical => Vectorizer::Lexical {
            max_features: config.tfidf_max_features,
        },
        VectorizerKind::Semantic => Vectorizer::Semantic(Arc::new(SemanticEmbedder::new())),
    };
    info!("Vectorizer: {}", config.vectorizer);

    // Secondary scorer (LLM when an API key is configured, heuristic otherwise)
    let scorer: Arc<dyn CandidateScorer> = match &config.anthropic_api_key {
        Some(api_key) => {
            let llm = LlmClient::new(api_key.clone(), config.rank_timeout)
                .context("Failed to build LLM client")?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmScorer::new(llm, config.llm_text_budget))
        }
        None => Arc::new(HeuristicScorer),
    };
    info!(
        "Scorer: {} (weights: similarity={}, secondary={})",
        scorer.backend().as_str(),
        config.weights.similarity,
        config.weights.secondary
    );

    let ranker = Ranker::new(
        vectorizer,
        scorer,
        RankOptions {
            weights: config.weights,
            preview_chars: config.preview_chars,
            concurrency: config.scoring_concurrency,
            timeout: config.rank_timeout,
        },
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        ranker: Arc::new(ranker),
        extractor: Arc::new(DocumentExtractor),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
