//! Cosine similarity between the job vector and each candidate vector.

/// Floor applied to the magnitude product so zero vectors score 0 instead of NaN.
const MAGNITUDE_FLOOR: f64 = 1e-9;

/// Cosine similarity clamped to [0, 1].
///
/// Mismatched lengths only compare the shared prefix; a zero vector on either
/// side always yields 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    let sim = dot / (norm_a * norm_b).max(MAGNITUDE_FLOOR);
    if sim.is_finite() {
        sim.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Scores every candidate vector against `job`, preserving input order.
pub fn score_against(job: &[f32], candidates: &[Vec<f32>]) -> Vec<f64> {
    candidates
        .iter()
        .map(|candidate| cosine_similarity(job, candidate))
        .collect()
}

fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}
