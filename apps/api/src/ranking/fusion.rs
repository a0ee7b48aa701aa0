//! Score Fusion: blends similarity and the secondary score into the final rank score.

use serde::{Deserialize, Serialize};

/// Fusion weights. They do not need to sum to 1; the result is clamped anyway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub similarity: f64,
    pub secondary: f64,
}

impl ScoreWeights {
    /// Blend used with the keyword heuristic as secondary score.
    pub const HEURISTIC: Self = Self {
        similarity: 0.7,
        secondary: 0.3,
    };

    /// Blend used when an LLM supplies the secondary score.
    pub const LLM: Self = Self {
        similarity: 0.6,
        secondary: 0.4,
    };
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::HEURISTIC
    }
}

/// `clamp(round(w_sim * similarity * 100 + w_sec * secondary), 0, 100)`.
///
/// Non-finite intermediate values fuse to 0.
pub fn fuse(similarity: f64, secondary: f64, weights: ScoreWeights) -> u32 {
    let raw = weights.similarity * similarity * 100.0 + weights.secondary * secondary;
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u32
}

/// Coarse label for a final score; thresholds match the screening UI colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBand {
    Strong,
    Moderate,
    Weak,
}

impl FitBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 75 {
            Self::Strong
        } else if score >= 45 {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_blend() {
        // 0.7 * 0.5 * 100 + 0.3 * 40 = 35 + 12 = 47
        assert_eq!(fuse(0.5, 40.0, ScoreWeights::HEURISTIC), 47);
    }

    #[test]
    fn test_llm_blend() {
        // 0.6 * 0.8 * 100 + 0.4 * 90 = 48 + 36 = 84
        assert_eq!(fuse(0.8, 90.0, ScoreWeights::LLM), 84);
    }

    #[test]
    fn test_rounds_to_nearest() {
        let weights = ScoreWeights {
            similarity: 1.0,
            secondary: 0.0,
        };
        assert_eq!(fuse(0.456, 0.0, weights), 46);
        assert_eq!(fuse(0.454, 0.0, weights), 45);
    }

    #[test]
    fn test_clamped_for_extreme_weights_and_inputs() {
        let heavy = ScoreWeights {
            similarity: 10.0,
            secondary: 10.0,
        };
        assert_eq!(fuse(1.0, 100.0, heavy), 100);

        let negative = ScoreWeights {
            similarity: -1.0,
            secondary: -1.0,
        };
        assert_eq!(fuse(1.0, 100.0, negative), 0);

        assert_eq!(fuse(f64::NAN, 50.0, ScoreWeights::default()), 0);
        assert_eq!(fuse(0.5, f64::INFINITY, ScoreWeights::default()), 0);
    }

    #[test]
    fn test_zero_inputs_fuse_to_zero() {
        assert_eq!(fuse(0.0, 0.0, ScoreWeights::HEURISTIC), 0);
    }

    #[test]
    fn test_fit_band_thresholds() {
        assert_eq!(FitBand::from_score(100), FitBand::Strong);
        assert_eq!(FitBand::from_score(75), FitBand::Strong);
        assert_eq!(FitBand::from_score(74), FitBand::Moderate);
        assert_eq!(FitBand::from_score(45), FitBand::Moderate);
        assert_eq!(FitBand::from_score(44), FitBand::Weak);
        assert_eq!(FitBand::from_score(0), FitBand::Weak);
    }
}
