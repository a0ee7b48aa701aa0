// LLM prompt constants for candidate assessment.
// Reuses the cross-cutting JSON-only fragment from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// System prompt for candidate assessment.
pub const ASSESSMENT_SYSTEM: &str = "You are an experienced technical recruiter screening \
    resumes against a job description. Judge only what the resume text shows. \
    Never invent experience the candidate does not state.";

/// Assessment prompt template.
/// Replace: {job_description}, {similarity}, {resume_text}
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"Assess how well this candidate fits the job.

JOB DESCRIPTION:
{job_description}

LEXICAL/SEMANTIC SIMILARITY (0.0 - 1.0, computed separately): {similarity}

RESUME TEXT (may be truncated):
{resume_text}

Return a JSON object with this EXACT schema:
{
  "score": 72,
  "strengths": ["Five years of production Python", "Led React migration"],
  "weaknesses": ["No SQL experience mentioned"]
}

RULES:
1. `score` is an integer from 0 to 100 reflecting overall fit for THIS job
2. At most 3 strengths and at most 2 weaknesses, each under 15 words
3. Strengths and weaknesses must reference concrete evidence (or its absence) in the resume
4. Return ONLY the JSON object"#;

/// Full system prompt: role framing plus the shared JSON-only rules.
pub fn assessment_system() -> String {
    format!("{ASSESSMENT_SYSTEM} {JSON_ONLY_SYSTEM}")
}

/// Fills the assessment template. `resume_text` must already be truncated.
pub fn build_assessment_prompt(job_description: &str, resume_text: &str, similarity: f64) -> String {
    ASSESSMENT_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{similarity}", &format!("{similarity:.3}"))
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let prompt = build_assessment_prompt("rust engineer", "ten years of rust", 0.41234);
        assert!(prompt.contains("rust engineer"));
        assert!(prompt.contains("ten years of rust"));
        assert!(prompt.contains("0.412"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{similarity}"));
    }

    #[test]
    fn test_system_prompt_requires_json() {
        assert!(assessment_system().contains("valid JSON only"));
    }
}
