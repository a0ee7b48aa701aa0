use std::sync::Arc;

use crate::config::Config;
use crate::extraction::TextExtractor;
use crate::ranking::pipeline::Ranker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Vectorizer and secondary scorer are chosen once at startup.
    pub ranker: Arc<Ranker>,
    /// Pluggable document extractor. Default: DocumentExtractor (PDF, DOCX, TXT).
    pub extractor: Arc<dyn TextExtractor>,
}
