use serde::{Serialize, Serializer};

use crate::ranking::fusion::FitBand;
use crate::ranking::scoring::ScorerBackend;

/// Filename reported for candidates submitted without one.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// One resume as plain text, as handed to the ranker. Lives for one request.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub filename: Option<String>,
    pub raw_text: String,
}

impl Candidate {
    pub fn new(filename: Option<String>, raw_text: impl Into<String>) -> Self {
        Self {
            filename,
            raw_text: raw_text.into(),
        }
    }
}

/// Scores and explanation computed for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Cosine similarity in [0, 1]; serialized rounded to 3 decimals.
    #[serde(serialize_with = "serialize_rounded")]
    pub similarity: f64,
    /// Heuristic or LLM score in [0, 100].
    pub secondary_score: f64,
    /// Fused score in [0, 100]; the ranking key.
    pub final_score: u32,
    pub fit_band: FitBand,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub scorer_backend: ScorerBackend,
}

/// A ranked candidate as returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    /// 1-based position after sorting.
    pub rank: usize,
    pub filename: String,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
    pub text_preview: String,
}

impl RankedResult {
    /// Builds the result for `candidate`. `rank` is assigned after sorting.
    pub fn new(candidate: Candidate, breakdown: ScoreBreakdown, preview_chars: usize) -> Self {
        let text_preview = candidate.raw_text.chars().take(preview_chars).collect();
        Self {
            rank: 0,
            filename: candidate
                .filename
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_FILENAME.to_string()),
            breakdown,
            text_preview,
        }
    }

    pub fn final_score(&self) -> u32 {
        self.breakdown.final_score
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

/// Rounds `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(similarity: f64, final_score: u32) -> ScoreBreakdown {
        ScoreBreakdown {
            similarity,
            secondary_score: 0.0,
            final_score,
            fit_band: FitBand::from_score(final_score),
            strengths: vec!["python".to_string()],
            weaknesses: vec!["missing skill: sql".to_string()],
            scorer_backend: ScorerBackend::Heuristic,
        }
    }

    #[test]
    fn test_missing_filename_defaults_to_unknown() {
        let result = RankedResult::new(Candidate::new(None, "text"), breakdown(0.0, 0), 400);
        assert_eq!(result.filename, "unknown");

        let blank = RankedResult::new(
            Candidate::new(Some("  ".to_string()), "text"),
            breakdown(0.0, 0),
            400,
        );
        assert_eq!(blank.filename, "unknown");
    }

    #[test]
    fn test_preview_truncates_by_characters() {
        let candidate = Candidate::new(Some("cv.txt".to_string()), "ünïcödé résumé");
        let result = RankedResult::new(candidate, breakdown(0.0, 0), 7);
        assert_eq!(result.text_preview, "ünïcödé");
    }

    #[test]
    fn test_preview_keeps_short_text_whole() {
        let candidate = Candidate::new(None, "short");
        let result = RankedResult::new(candidate, breakdown(0.0, 0), 400);
        assert_eq!(result.text_preview, "short");
    }

    #[test]
    fn test_serializes_flat_with_rounded_similarity() {
        let mut result = RankedResult::new(
            Candidate::new(Some("a.pdf".to_string()), "python"),
            breakdown(0.123456, 80),
            400,
        );
        result.rank = 1;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["filename"], "a.pdf");
        assert_eq!(json["similarity"], 0.123);
        assert_eq!(json["final_score"], 80);
        assert_eq!(json["fit_band"], "strong");
        assert_eq!(json["scorer_backend"], "heuristic");
        assert_eq!(json["strengths"][0], "python");
        assert_eq!(json["text_preview"], "python");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.98765, 3), 0.988);
        assert_eq!(round_to(0.0, 3), 0.0);
    }
}
