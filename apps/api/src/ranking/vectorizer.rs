//! Vectorizer: turns the job description and every candidate into vectors of one
//! shared dimensionality.
//!
//! Two strategies, chosen at startup via `VECTORIZER`:
//! - `Lexical`: TF-IDF over unigrams + bigrams. Fitted fresh for every batch
//!   (`TfidfVectorizer::fit` returns a new value, nothing is cached), so two
//!   concurrent requests never see each other's vocabulary.
//! - `Semantic`: sentence embeddings (all-MiniLM-L6-v2 via fastembed). The model is
//!   loaded once per process on first use and only read afterwards.
//!
//! `Vectorizer::vectorize` never fails: on any error every text gets a zero vector,
//! which the similarity scorer maps to 0.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Output dimensionality of all-MiniLM-L6-v2.
pub const SEMANTIC_DIMENSION: usize = 384;

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("empty vocabulary: corpus contains no indexable terms")]
    EmptyVocabulary,

    #[error("embedding model error: {0}")]
    Embedding(String),

    #[error("expected {expected} vectors of equal length, got {got} (dimensions {dimensions:?})")]
    Shape {
        expected: usize,
        got: usize,
        dimensions: Vec<usize>,
    },

    #[error("vectorization task failed: {0}")]
    Task(String),
}

/// Which vectorization strategy the service runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    #[default]
    Lexical,
    Semantic,
}

impl FromStr for VectorizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexical" | "tfidf" | "tf-idf" => Ok(Self::Lexical),
            "semantic" | "embedding" | "embeddings" => Ok(Self::Semantic),
            other => Err(format!(
                "unknown vectorizer '{other}' (expected 'lexical' or 'semantic')"
            )),
        }
    }
}

impl fmt::Display for VectorizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => f.write_str("lexical"),
            Self::Semantic => f.write_str("semantic"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy dispatch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Vectorizer {
    Lexical { max_features: usize },
    Semantic(Arc<SemanticEmbedder>),
}

impl Vectorizer {
    pub fn kind(&self) -> VectorizerKind {
        match self {
            Self::Lexical { .. } => VectorizerKind::Lexical,
            Self::Semantic(_) => VectorizerKind::Semantic,
        }
    }

    /// Vectorizes `texts` as one batch. Returns exactly `texts.len()` vectors of equal
    /// length; all of them are zero vectors if the strategy fails.
    pub async fn vectorize(&self, texts: Vec<String>) -> Vec<Vec<f32>> {
        let expected = texts.len();

        match self.try_vectorize(texts).await.and_then(|v| check_shape(v, expected)) {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!(
                    error = %e,
                    vectorizer = %self.kind(),
                    texts = expected,
                    "Vectorization failed, falling back to zero vectors"
                );
                vec![vec![0.0; self.fallback_dimension()]; expected]
            }
        }
    }

    async fn try_vectorize(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, VectorizeError> {
        match self {
            Self::Lexical { max_features } => {
                let max_features = *max_features;
                // CPU-bound fit; keep it off the async executor.
                tokio::task::spawn_blocking(move || {
                    TfidfVectorizer::fit(&texts, max_features).map(|v| v.transform(&texts))
                })
                .await
                .map_err(|e| VectorizeError::Task(e.to_string()))?
            }
            Self::Semantic(embedder) => embedder.embed(&texts).await,
        }
    }

    fn fallback_dimension(&self) -> usize {
        match self {
            Self::Lexical { .. } => 1,
            Self::Semantic(_) => SEMANTIC_DIMENSION,
        }
    }
}

fn check_shape(vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>, VectorizeError> {
    let consistent = vectors
        .first()
        .map(|first| vectors.iter().all(|v| v.len() == first.len()))
        .unwrap_or(true);

    if vectors.len() == expected && consistent {
        Ok(vectors)
    } else {
        Err(VectorizeError::Shape {
            expected,
            got: vectors.len(),
            dimensions: vectors.iter().map(Vec::len).collect(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lexical: TF-IDF
// ────────────────────────────────────────────────────────────────────────────

/// A TF-IDF model fitted over one batch.
///
/// Terms are lowercase tokens of two or more word characters plus the bigrams of
/// adjacent tokens. IDF is smoothed (`ln((1 + n) / (1 + df)) + 1`) and every output
/// row is L2-normalized.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fits vocabulary and IDF weights over `corpus`.
    ///
    /// When the vocabulary exceeds `max_features` (0 = unbounded), the terms with the
    /// highest corpus-wide frequency are kept; ties keep the alphabetically first term.
    pub fn fit(corpus: &[String], max_features: usize) -> Result<Self, VectorizeError> {
        let counts: Vec<HashMap<String, u32>> = corpus.iter().map(|d| term_counts(d)).collect();

        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        let mut total_freq: HashMap<&str, u64> = HashMap::new();
        for doc in &counts {
            for (term, count) in doc {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                *total_freq.entry(term.as_str()).or_insert(0) += u64::from(*count);
            }
        }

        if total_freq.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let mut ranked: Vec<(&str, u64)> = total_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if max_features > 0 && ranked.len() > max_features {
            ranked.truncate(max_features);
        }

        // Column order is alphabetical so the layout is independent of hash order.
        let kept: BTreeSet<&str> = ranked.into_iter().map(|(term, _)| term).collect();

        let n_docs = corpus.len() as f32;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (column, term) in kept.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), column);
        }

        debug!(
            terms = vocabulary.len(),
            documents = corpus.len(),
            "TF-IDF vocabulary fitted"
        );

        Ok(Self { vocabulary, idf })
    }

    /// Projects `texts` into the fitted space. Unknown terms are ignored, so a text
    /// sharing nothing with the vocabulary maps to the zero vector.
    pub fn transform(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts
            .iter()
            .map(|text| {
                let mut row = vec![0.0_f32; self.dimension()];
                for (term, count) in term_counts(text) {
                    if let Some(&column) = self.vocabulary.get(&term) {
                        row[column] = count as f32 * self.idf[column];
                    }
                }
                l2_normalize(&mut row);
                row
            })
            .collect()
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, u32> {
    let tokens = tokenize(text);
    let mut counts = HashMap::new();

    for token in &tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }

    counts
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Semantic: process-wide sentence-embedding model
// ────────────────────────────────────────────────────────────────────────────

/// Lazily loaded all-MiniLM-L6-v2 model.
///
/// The first caller downloads/loads the model on the blocking pool; concurrent
/// callers wait on the same initialization. A failed load is not cached, so the
/// next request retries. After init the model is shared read-only.
#[derive(Default)]
pub struct SemanticEmbedder {
    model: OnceCell<Arc<TextEmbedding>>,
}

impl SemanticEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>, VectorizeError> {
        self.model
            .get_or_try_init(|| async {
                info!("Loading sentence-embedding model all-MiniLM-L6-v2...");
                let model = tokio::task::spawn_blocking(|| {
                    let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                        .with_show_download_progress(false);
                    TextEmbedding::try_new(options)
                })
                .await
                .map_err(|e| VectorizeError::Task(e.to_string()))?
                .map_err(|e| {
                    VectorizeError::Embedding(format!("model initialization failed: {e}"))
                })?;
                info!("Sentence-embedding model loaded");
                Ok(Arc::new(model))
            })
            .await
            .cloned()
    }

    /// Embeds each text independently. Blank texts map to zero vectors without
    /// touching the model.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorizeError> {
        let (indices, inputs): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .unzip();

        let mut vectors = vec![vec![0.0_f32; SEMANTIC_DIMENSION]; texts.len()];
        if inputs.is_empty() {
            return Ok(vectors);
        }

        let model = self.model().await?;
        let embedded = tokio::task::spawn_blocking(move || model.embed(inputs, None))
            .await
            .map_err(|e| VectorizeError::Task(e.to_string()))?
            .map_err(|e| VectorizeError::Embedding(format!("embedding failed: {e}")))?;

        if embedded.len() != indices.len() {
            return Err(VectorizeError::Shape {
                expected: indices.len(),
                got: embedded.len(),
                dimensions: embedded.iter().map(Vec::len).collect(),
            });
        }
        for (index, vector) in indices.into_iter().zip(embedded) {
            vectors[index] = vector;
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_terms_include_unigrams_and_bigrams() {
        let counts = term_counts("rust async rust");
        assert_eq!(counts.get("rust"), Some(&2));
        assert_eq!(counts.get("async"), Some(&1));
        assert_eq!(counts.get("rust async"), Some(&1));
        assert_eq!(counts.get("async rust"), Some(&1));
    }

    #[test]
    fn test_single_character_tokens_are_dropped() {
        let counts = term_counts("c++ a b go");
        assert!(counts.get("c").is_none());
        assert_eq!(counts.get("go"), Some(&1));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_fit_rejects_empty_vocabulary() {
        let result = TfidfVectorizer::fit(&corpus(&["", "a b c", "!!"]), 5000);
        assert!(matches!(result, Err(VectorizeError::EmptyVocabulary)));
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let docs = corpus(&["rust rust rust go", "rust python"]);
        let fitted = TfidfVectorizer::fit(&docs, 1).unwrap();
        assert_eq!(fitted.dimension(), 1);
        assert!(fitted.vocabulary.contains_key("rust"));
    }

    #[test]
    fn test_rows_share_dimension_and_are_unit_length() {
        let docs = corpus(&[
            "python react sql",
            "python developer with react experience",
            "java spring",
        ]);
        let fitted = TfidfVectorizer::fit(&docs, 5000).unwrap();
        let rows = fitted.transform(&docs);

        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), fitted.dimension());
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_unknown_text_maps_to_zero_vector() {
        let fitted = TfidfVectorizer::fit(&corpus(&["python react"]), 5000).unwrap();
        let rows = fitted.transform(&corpus(&["haskell ocaml"]));
        assert!(rows[0].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_rarer_terms_get_higher_idf() {
        let docs = corpus(&["python react", "python sql", "python go"]);
        let fitted = TfidfVectorizer::fit(&docs, 5000).unwrap();
        let python = fitted.idf[fitted.vocabulary["python"]];
        let react = fitted.idf[fitted.vocabulary["react"]];
        assert!(react > python);
        assert!((python - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fits_are_independent_per_batch() {
        let first = TfidfVectorizer::fit(&corpus(&["rust tokio axum"]), 5000).unwrap();
        let second = TfidfVectorizer::fit(&corpus(&["java spring"]), 5000).unwrap();
        assert!(first.vocabulary.contains_key("rust"));
        assert!(!second.vocabulary.contains_key("rust"));
        assert!(second.vocabulary.contains_key("java spring"));
    }

    #[test]
    fn test_vectorizer_kind_parsing() {
        assert_eq!("lexical".parse::<VectorizerKind>(), Ok(VectorizerKind::Lexical));
        assert_eq!("TFIDF".parse::<VectorizerKind>(), Ok(VectorizerKind::Lexical));
        assert_eq!(" semantic ".parse::<VectorizerKind>(), Ok(VectorizerKind::Semantic));
        assert!("bm25".parse::<VectorizerKind>().is_err());
        assert_eq!(VectorizerKind::Semantic.to_string(), "semantic");
    }

    #[tokio::test]
    async fn test_lexical_vectorize_returns_consistent_batch() {
        let vectorizer = Vectorizer::Lexical { max_features: 5000 };
        let vectors = vectorizer
            .vectorize(corpus(&["python react sql", "python developer", ""]))
            .await;

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == vectors[0].len()));
        assert!(vectors[2].iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_degenerate_corpus_falls_back_to_zero_vectors() {
        let vectorizer = Vectorizer::Lexical { max_features: 5000 };
        let vectors = vectorizer.vectorize(corpus(&["x", "y z", "!"])).await;

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().flatten().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_semantic_blank_batch_skips_model_load() {
        let embedder = SemanticEmbedder::new();
        let vectors = embedder.embed(&corpus(&["", "   "])).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == SEMANTIC_DIMENSION));
        assert!(embedder.model.get().is_none());
    }

    #[test]
    fn test_check_shape_rejects_ragged_output() {
        let ragged = vec![vec![0.0; 3], vec![0.0; 2]];
        assert!(check_shape(ragged, 2).is_err());
        assert!(check_shape(vec![vec![0.0; 3]], 2).is_err());
        assert!(check_shape(vec![], 0).is_ok());
    }
}
