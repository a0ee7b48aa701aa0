//! Heuristic Analyzer: keyword-based strengths, weaknesses, and overlap score.
//!
//! Independent of vectorization, so it also runs for batches that skip the
//! vectorizer. Both inputs are expected to be normalized already.

use std::collections::HashSet;

/// Reference skill list, scanned in order. Earlier skills win the limited slots.
pub const COMMON_SKILLS: &[&str] = &[
    "python",
    "java",
    "c++",
    "javascript",
    "react",
    "node",
    "fastapi",
    "django",
    "sql",
    "mysql",
    "postgres",
    "mongodb",
    "aws",
    "gcp",
    "docker",
    "kubernetes",
    "linux",
    "html",
    "css",
    "git",
    "rest",
    "api",
    "tensorflow",
    "pytorch",
];

pub const MAX_STRENGTHS: usize = 3;
pub const MAX_WEAKNESSES: usize = 2;

pub const GENERIC_STRENGTHS: [&str; MAX_STRENGTHS] = [
    "Relevant keywords detected",
    "Readable formatting",
    "General experience",
];

pub const GENERIC_WEAKNESSES: [&str; MAX_WEAKNESSES] = [
    "Lacks measurable achievements",
    "Could provide more specific metrics",
];

/// Number of matched job words that maps to a full overlap score of 100.
const OVERLAP_SATURATION: usize = 10;
/// Job words this short or shorter are ignored by the overlap score.
const MIN_OVERLAP_WORD_CHARS: usize = 3;

/// Strengths and weaknesses for one candidate. Lists are never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl Explanation {
    /// The fixed explanation used whenever nothing more specific is available.
    pub fn generic() -> Self {
        Self {
            strengths: GENERIC_STRENGTHS.iter().map(|s| s.to_string()).collect(),
            weaknesses: GENERIC_WEAKNESSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Scans `skills` in order:
/// 1. in job and candidate → strength `"<skill> (matches job requirement)"`
/// 2. in candidate only → strength `"<skill>"`
/// 3. in job only → weakness `"missing skill: <skill>"`
///
/// Matching is substring containment on normalized text. Results are
/// deduplicated in insertion order, capped at 3 strengths / 2 weaknesses, and
/// replaced by the generic lists when empty.
pub fn analyze(job_text: &str, candidate_text: &str, skills: &[&str]) -> Explanation {
    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();

    for skill in skills {
        let in_job = job_text.contains(skill);
        let in_candidate = candidate_text.contains(skill);

        match (in_job, in_candidate) {
            (true, true) => strengths.push(format!("{skill} (matches job requirement)")),
            (false, true) => strengths.push(skill.to_string()),
            (true, false) => weaknesses.push(format!("missing skill: {skill}")),
            (false, false) => {}
        }
    }

    let mut strengths = dedup_capped(strengths, MAX_STRENGTHS);
    let mut weaknesses = dedup_capped(weaknesses, MAX_WEAKNESSES);

    if strengths.is_empty() {
        strengths = Explanation::generic().strengths;
    }
    if weaknesses.is_empty() {
        weaknesses = Explanation::generic().weaknesses;
    }

    Explanation {
        strengths,
        weaknesses,
    }
}

/// Keyword-overlap score in 0..=100: distinct job words longer than two
/// characters that appear anywhere in the candidate text, ten per 100 points.
pub fn keyword_overlap_score(job_text: &str, candidate_text: &str) -> u32 {
    let matched = job_text
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_OVERLAP_WORD_CHARS)
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|word| candidate_text.contains(word))
        .count();

    let score = matched * 100 / OVERLAP_SATURATION;
    score.min(100) as u32
}

fn dedup_capped(items: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(cap)
        .collect()
}
