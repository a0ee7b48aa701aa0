//! Axum route handlers for the Ranking API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_all, UploadedDocument};
use crate::models::candidate::{Candidate, RankedResult};
use crate::ranking::report;
use crate::ranking::scoring::ScorerBackend;
use crate::ranking::vectorizer::VectorizerKind;
use crate::state::AppState;

/// Multipart field carrying the job description.
const JOB_DESCRIPTION_FIELD: &str = "job_description";
/// Multipart field name for resume uploads; browsers may send either form.
const FILES_FIELDS: [&str; 2] = ["files", "files[]"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RankTextRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub candidates: Vec<TextCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct TextCandidate {
    pub filename: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub request_id: Uuid,
    pub ranked_at: DateTime<Utc>,
    pub vectorizer: VectorizerKind,
    pub scorer: ScorerBackend,
    pub results: Vec<RankedResult>,
}

/// A parsed multipart ranking form.
struct RankForm {
    job_description: String,
    documents: Vec<UploadedDocument>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /rank, POST /api/v1/rank
/// Ranks uploaded resumes (PDF, DOCX, TXT) against a job description.
pub async fn handle_rank_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RankResponse>, AppError> {
    let form = read_rank_form(multipart).await?;
    let response = rank_documents(&state, form).await?;
    Ok(Json(response))
}

/// POST /api/v1/rank/text
/// Same pipeline for callers that already hold plain text.
pub async fn handle_rank_text(
    State(state): State<AppState>,
    Json(req): Json<RankTextRequest>,
) -> Result<Json<RankResponse>, AppError> {
    let candidates = req
        .candidates
        .into_iter()
        .map(|c| Candidate::new(c.filename, c.text.unwrap_or_default()))
        .collect();

    let response = rank_candidates(&state, &req.job_description, candidates).await?;
    Ok(Json(response))
}

/// POST /api/v1/rank/report.csv
/// Ranks uploaded resumes and returns the summary as a CSV download.
pub async fn handle_rank_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_rank_form(multipart).await?;
    let response = rank_documents(&state, form).await?;
    let csv = report::to_csv(&response.results)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ranking.csv\"",
            ),
        ],
        csv,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared flow
// ────────────────────────────────────────────────────────────────────────────

async fn read_rank_form(mut multipart: Multipart) -> Result<RankForm, AppError> {
    let mut job_description = String::new();
    let mut documents = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == JOB_DESCRIPTION_FIELD {
            job_description = field.text().await?;
        } else if FILES_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            documents.push(UploadedDocument { filename, bytes });
        } else {
            debug!(field = %name, "Ignoring unknown multipart field");
        }
    }

    Ok(RankForm {
        job_description,
        documents,
    })
}

async fn rank_documents(state: &AppState, form: RankForm) -> Result<RankResponse, AppError> {
    validate_request(&form.job_description, form.documents.len())?;

    let candidates = extract_all(state.extractor.clone(), form.documents).await;
    rank_candidates(state, &form.job_description, candidates).await
}

async fn rank_candidates(
    state: &AppState,
    job_description: &str,
    candidates: Vec<Candidate>,
) -> Result<RankResponse, AppError> {
    validate_request(job_description, candidates.len())?;

    let request_id = Uuid::new_v4();
    let span = info_span!("rank", %request_id, candidates = candidates.len());
    let results = state
        .ranker
        .rank(job_description, candidates)
        .instrument(span)
        .await;

    info!(
        %request_id,
        candidates = results.len(),
        top_score = results.first().map(|r| r.final_score()).unwrap_or(0),
        "Ranking complete"
    );

    Ok(RankResponse {
        request_id,
        ranked_at: Utc::now(),
        vectorizer: state.ranker.vectorizer_kind(),
        scorer: state.ranker.scorer_backend(),
        results,
    })
}

fn validate_request(job_description: &str, documents: usize) -> Result<(), AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if documents == 0 {
        return Err(AppError::Validation(
            "At least one resume is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejects_blank_job() {
        assert!(matches!(
            validate_request("  \n", 2),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_no_documents() {
        assert!(matches!(
            validate_request("rust engineer", 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_accepts_job_and_documents() {
        assert!(validate_request("rust engineer", 1).is_ok());
    }

    #[test]
    fn test_text_request_defaults_missing_fields() {
        let req: RankTextRequest =
            serde_json::from_str(r#"{"candidates": [{"filename": "a.txt"}, {"text": "rust"}]}"#)
                .unwrap();
        assert!(req.job_description.is_empty());
        assert_eq!(req.candidates.len(), 2);
        assert_eq!(req.candidates[0].text, None);
        assert_eq!(req.candidates[1].filename, None);
    }
}
