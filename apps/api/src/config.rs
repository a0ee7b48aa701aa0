use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ranking::fusion::ScoreWeights;
use crate::ranking::vectorizer::VectorizerKind;

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub vectorizer: VectorizerKind,
    pub tfidf_max_features: usize,
    pub weights: ScoreWeights,
    pub preview_chars: usize,
    /// Absent → heuristic secondary scorer.
    pub anthropic_api_key: Option<String>,
    pub llm_text_budget: usize,
    pub scoring_concurrency: usize,
    pub rank_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty());

        // The two blends differ by secondary scorer; explicit weights always win.
        let default_weights = if anthropic_api_key.is_some() {
            ScoreWeights::LLM
        } else {
            ScoreWeights::HEURISTIC
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            vectorizer: match lookup("VECTORIZER") {
                Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
                None => VectorizerKind::default(),
            },
            tfidf_max_features: parse_or(&lookup, "TFIDF_MAX_FEATURES", 5000)?,
            weights: ScoreWeights {
                similarity: parse_or(&lookup, "SIMILARITY_WEIGHT", default_weights.similarity)?,
                secondary: parse_or(&lookup, "SECONDARY_WEIGHT", default_weights.secondary)?,
            },
            preview_chars: parse_or(&lookup, "PREVIEW_CHARS", 400)?,
            anthropic_api_key,
            llm_text_budget: parse_or(&lookup, "LLM_TEXT_BUDGET", 3500)?,
            scoring_concurrency: parse_or::<usize>(&lookup, "SCORING_CONCURRENCY", 4)?.max(1),
            rank_timeout: Duration::from_secs(parse_or(&lookup, "RANK_TIMEOUT_SECS", 60)?),
            max_upload_bytes: parse_or::<usize>(&lookup, "MAX_UPLOAD_MB", 20)? * 1024 * 1024,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.vectorizer, VectorizerKind::Lexical);
        assert_eq!(config.tfidf_max_features, 5000);
        assert_eq!(config.weights, ScoreWeights::HEURISTIC);
        assert_eq!(config.preview_chars, 400);
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.llm_text_budget, 3500);
        assert_eq!(config.rank_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_api_key_switches_default_weights() {
        let config = config_with(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.weights, ScoreWeights::LLM);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = config_with(&[("ANTHROPIC_API_KEY", "  ")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.weights, ScoreWeights::HEURISTIC);
    }

    #[test]
    fn test_explicit_weights_override_defaults() {
        let config = config_with(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("SIMILARITY_WEIGHT", "0.9"),
            ("SECONDARY_WEIGHT", " 0.5 "),
        ])
        .unwrap();
        assert_eq!(config.weights.similarity, 0.9);
        assert_eq!(config.weights.secondary, 0.5);
    }

    #[test]
    fn test_semantic_vectorizer_selected() {
        let config = config_with(&[("VECTORIZER", "semantic")]).unwrap();
        assert_eq!(config.vectorizer, VectorizerKind::Semantic);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_with(&[("PORT", "eighty")]).is_err());
        assert!(config_with(&[("VECTORIZER", "bm25")]).is_err());
        assert!(config_with(&[("SIMILARITY_WEIGHT", "heavy")]).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_raised_to_one() {
        let config = config_with(&[("SCORING_CONCURRENCY", "0")]).unwrap();
        assert_eq!(config.scoring_concurrency, 1);
    }
}
