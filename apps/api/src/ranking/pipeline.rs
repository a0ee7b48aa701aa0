//! Ranking Orchestrator: runs one batch through the pipeline.
//!
//! Stages: received → normalized → vectorized → scored → sorted → returned.
//! All-blank batches skip from normalized straight to sorted with heuristic-only
//! explanations. Assessment runs with bounded concurrency under a shared deadline;
//! a stalled candidate holds one slot and does not delay the others.
//!
//! `Ranker::rank` never fails. Vectorization errors become zero similarity and
//! scorer errors or timeouts become `Assessment::fallback`, so every submitted
//! candidate comes back scored.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::candidate::{Candidate, RankedResult, ScoreBreakdown};
use crate::ranking::fusion::{fuse, FitBand, ScoreWeights};
use crate::ranking::normalize::normalize_text;
use crate::ranking::scoring::{
    heuristic_assessment, Assessment, AssessmentInput, CandidateScorer, ScorerBackend,
};
use crate::ranking::similarity::score_against;
use crate::ranking::vectorizer::{Vectorizer, VectorizerKind};

/// Pipeline stages, logged as a batch moves through `Ranker::rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Normalized,
    Vectorized,
    Scored,
    Sorted,
    Returned,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Normalized => "normalized",
            Self::Vectorized => "vectorized",
            Self::Scored => "scored",
            Self::Sorted => "sorted",
            Self::Returned => "returned",
        }
    }
}

/// Per-request knobs, fixed at startup.
#[derive(Debug, Clone)]
pub struct RankOptions {
    pub weights: ScoreWeights,
    pub preview_chars: usize,
    /// Max assessments in flight at once.
    pub concurrency: usize,
    /// Deadline for all assessments of one batch.
    pub timeout: Duration,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            preview_chars: 400,
            concurrency: 4,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Stateless between requests: the only shared pieces are the scorer and, for the
/// semantic strategy, the read-only embedding model inside `Vectorizer`.
#[derive(Clone)]
pub struct Ranker {
    vectorizer: Vectorizer,
    scorer: Arc<dyn CandidateScorer>,
    options: RankOptions,
}

impl Ranker {
    pub fn new(vectorizer: Vectorizer, scorer: Arc<dyn CandidateScorer>, options: RankOptions) -> Self {
        Self {
            vectorizer,
            scorer,
            options,
        }
    }

    pub fn vectorizer_kind(&self) -> VectorizerKind {
        self.vectorizer.kind()
    }

    pub fn scorer_backend(&self) -> ScorerBackend {
        self.scorer.backend()
    }

    /// Ranks `candidates` against `job_description`.
    ///
    /// Returns one result per candidate, sorted by final score descending; equal
    /// scores keep their input order.
    pub async fn rank(&self, job_description: &str, candidates: Vec<Candidate>) -> Vec<RankedResult> {
        log_stage(Stage::Received, candidates.len());

        let job_text = normalize_text(Some(job_description));
        let texts: Vec<String> = candidates
            .iter()
            .map(|c| normalize_text(Some(&c.raw_text)))
            .collect();
        log_stage(Stage::Normalized, texts.len());

        let breakdowns = if texts.iter().all(|t| t.is_empty()) {
            info!(
                candidates = texts.len(),
                "All candidate texts are empty, skipping vectorization"
            );
            texts
                .iter()
                .map(|text| self.blank_batch_breakdown(&job_text, text))
                .collect::<Vec<_>>()
        } else {
            self.score_batch(&job_text, &texts).await
        };

        let mut results: Vec<RankedResult> = candidates
            .into_iter()
            .zip(breakdowns)
            .map(|(candidate, breakdown)| {
                RankedResult::new(candidate, breakdown, self.options.preview_chars)
            })
            .collect();

        // Vec::sort_by is stable: ties keep input order.
        results.sort_by(|a, b| b.final_score().cmp(&a.final_score()));
        for (position, result) in results.iter_mut().enumerate() {
            result.rank = position + 1;
        }
        log_stage(Stage::Sorted, results.len());

        log_stage(Stage::Returned, results.len());
        results
    }

    async fn score_batch(&self, job_text: &str, texts: &[String]) -> Vec<ScoreBreakdown> {
        let mut corpus = Vec::with_capacity(texts.len() + 1);
        corpus.push(job_text.to_string());
        corpus.extend(texts.iter().cloned());

        let vectors = self.vectorizer.vectorize(corpus).await;
        let similarities = match vectors.split_first() {
            Some((job_vector, candidate_vectors)) => score_against(job_vector, candidate_vectors),
            None => vec![0.0; texts.len()],
        };
        log_stage(Stage::Vectorized, similarities.len());

        let assessments = self.assess_all(job_text, texts, &similarities).await;
        log_stage(Stage::Scored, assessments.len());

        similarities
            .into_iter()
            .zip(assessments)
            .map(|(similarity, assessment)| self.breakdown(similarity, assessment))
            .collect()
    }

    /// Runs every assessment with at most `concurrency` in flight, all under one
    /// batch deadline. Completion order is free; the output follows `texts`.
    async fn assess_all(
        &self,
        job_text: &str,
        texts: &[String],
        similarities: &[f64],
    ) -> Vec<Assessment> {
        let deadline = Instant::now() + self.options.timeout;

        // Futures are built eagerly so the stream holds concrete, `Send` futures.
        let pending: Vec<_> = texts
            .iter()
            .zip(similarities.iter().copied())
            .enumerate()
            .map(|(index, (text, similarity))| {
                let input = AssessmentInput {
                    job_text,
                    candidate_text: text.as_str(),
                    similarity,
                    deadline,
                };
                async move { (index, self.assess_one(index, input).await) }
            })
            .collect();

        let mut assessed: Vec<(usize, Assessment)> = stream::iter(pending)
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        assessed.sort_by_key(|(index, _)| *index);

        assessed
            .into_iter()
            .map(|(_, assessment)| assessment)
            .collect()
    }

    async fn assess_one(&self, index: usize, input: AssessmentInput<'_>) -> Assessment {
        match tokio::time::timeout_at(input.deadline, self.scorer.assess(input)).await {
            Ok(Ok(assessment)) => assessment,
            Ok(Err(e)) => {
                warn!(
                    candidate = index,
                    error = %e,
                    "Assessment failed, using deterministic fallback"
                );
                Assessment::fallback(input.similarity)
            }
            Err(_) => {
                warn!(
                    candidate = index,
                    timeout_secs = self.options.timeout.as_secs(),
                    "Assessment timed out, using deterministic fallback"
                );
                Assessment::fallback(input.similarity)
            }
        }
    }

    fn breakdown(&self, similarity: f64, assessment: Assessment) -> ScoreBreakdown {
        let final_score = fuse(similarity, assessment.score, self.options.weights);
        ScoreBreakdown {
            similarity,
            secondary_score: assessment.score,
            final_score,
            fit_band: FitBand::from_score(final_score),
            strengths: assessment.strengths,
            weaknesses: assessment.weaknesses,
            scorer_backend: assessment.backend,
        }
    }

    /// Blank batches skip vectorization and fusion: similarity and final score are 0,
    /// the explanation still comes from the heuristic analyzer.
    fn blank_batch_breakdown(&self, job_text: &str, text: &str) -> ScoreBreakdown {
        let assessment = heuristic_assessment(job_text, text);
        ScoreBreakdown {
            similarity: 0.0,
            secondary_score: assessment.score,
            final_score: 0,
            fit_band: FitBand::from_score(0),
            strengths: assessment.strengths,
            weaknesses: assessment.weaknesses,
            scorer_backend: assessment.backend,
        }
    }
}

fn log_stage(stage: Stage, candidates: usize) {
    debug!(stage = stage.as_str(), candidates, "Ranking stage reached");
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
