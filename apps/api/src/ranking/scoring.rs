//! Candidate scoring: pluggable, trait-based secondary scorer.
//!
//! Default: `HeuristicScorer` (keyword overlap + skill analysis, deterministic).
//! Optional: `LlmScorer` (Claude), enabled when `ANTHROPIC_API_KEY` is set.
//!
//! The ranker holds an `Arc<dyn CandidateScorer>` chosen at startup. Any error
//! from a scorer is recovered by the ranker with `Assessment::fallback`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::llm_client::{LlmClient, LlmError};
use crate::ranking::heuristics::{
    analyze, keyword_overlap_score, Explanation, COMMON_SKILLS, MAX_STRENGTHS, MAX_WEAKNESSES,
};
use crate::ranking::prompts::{assessment_system, build_assessment_prompt};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Which path produced a candidate's secondary score and explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerBackend {
    Heuristic,
    Llm,
    /// Deterministic replacement after a scorer error or timeout.
    Fallback,
}

impl ScorerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

/// Input for one candidate assessment. Texts are normalized.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentInput<'a> {
    pub job_text: &'a str,
    pub candidate_text: &'a str,
    pub similarity: f64,
    /// Batch deadline; scorers must not plan work past it.
    pub deadline: Instant,
}

/// Secondary score (0–100) plus explanation for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub backend: ScorerBackend,
}

impl Assessment {
    /// Similarity-derived score with the generic explanation.
    pub fn fallback(similarity: f64) -> Self {
        let Explanation {
            strengths,
            weaknesses,
        } = Explanation::generic();
        let score = if similarity.is_finite() {
            (similarity * 100.0).round().clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            score,
            strengths,
            weaknesses,
            backend: ScorerBackend::Fallback,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("malformed assessment: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The secondary scorer capability: score one candidate and explain why.
///
/// Implement this to swap backends without touching the ranker or handlers.
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    /// Backend label reported for successful assessments.
    fn backend(&self) -> ScorerBackend;

    async fn assess(&self, input: AssessmentInput<'_>) -> Result<Assessment, ScoringError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicScorer (default)
// ────────────────────────────────────────────────────────────────────────────

/// Keyword-overlap score plus skill-list explanation. Never fails.
pub struct HeuristicScorer;

#[async_trait]
impl CandidateScorer for HeuristicScorer {
    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Heuristic
    }

    async fn assess(&self, input: AssessmentInput<'_>) -> Result<Assessment, ScoringError> {
        Ok(heuristic_assessment(input.job_text, input.candidate_text))
    }
}

/// Synchronous core of `HeuristicScorer`, also used for batches that skip scoring.
pub fn heuristic_assessment(job_text: &str, candidate_text: &str) -> Assessment {
    let explanation = analyze(job_text, candidate_text, COMMON_SKILLS);
    Assessment {
        score: f64::from(keyword_overlap_score(job_text, candidate_text)),
        strengths: explanation.strengths,
        weaknesses: explanation.weaknesses,
        backend: ScorerBackend::Heuristic,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmScorer (Claude-backed)
// ────────────────────────────────────────────────────────────────────────────

/// Raw assessment as returned by the model, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmAssessment {
    pub score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

pub struct LlmScorer {
    llm: LlmClient,
    /// Max characters of candidate text included in the prompt.
    text_budget: usize,
}

impl LlmScorer {
    pub fn new(llm: LlmClient, text_budget: usize) -> Self {
        Self { llm, text_budget }
    }

    /// User prompt for one candidate, with the resume cut to `text_budget` characters.
    pub fn prompt_for(&self, input: AssessmentInput<'_>) -> String {
        let resume_text = truncate_chars(input.candidate_text, self.text_budget);
        build_assessment_prompt(input.job_text, resume_text, input.similarity)
    }
}

#[async_trait]
impl CandidateScorer for LlmScorer {
    fn backend(&self) -> ScorerBackend {
        ScorerBackend::Llm
    }

    async fn assess(&self, input: AssessmentInput<'_>) -> Result<Assessment, ScoringError> {
        let prompt = self.prompt_for(input);
        let raw: LlmAssessment = self
            .llm
            .call_json(&prompt, &assessment_system(), input.deadline)
            .await?;
        validate_assessment(raw)
    }
}

/// Rejects out-of-range or non-finite scores; trims, caps, and backfills the lists.
pub fn validate_assessment(raw: LlmAssessment) -> Result<Assessment, ScoringError> {
    if !raw.score.is_finite() || !(0.0..=100.0).contains(&raw.score) {
        return Err(ScoringError::Malformed(format!(
            "score {} outside 0..=100",
            raw.score
        )));
    }

    let generic = Explanation::generic();
    let mut strengths = clean_list(raw.strengths, MAX_STRENGTHS);
    let mut weaknesses = clean_list(raw.weaknesses, MAX_WEAKNESSES);
    if strengths.is_empty() {
        strengths = generic.strengths;
    }
    if weaknesses.is_empty() {
        weaknesses = generic.weaknesses;
    }

    Ok(Assessment {
        score: raw.score,
        strengths,
        weaknesses,
        backend: ScorerBackend::Llm,
    })
}

fn clean_list(items: Vec<String>, cap: usize) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(cap)
        .collect()
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
