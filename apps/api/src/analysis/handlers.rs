use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::analysis::{analyze, AnalysisResult};
use crate::errors::AppError;
use crate::extraction::DocumentFormat;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let result = run_analysis(&state, req.resume_text, req.job_description).await?;
    Ok(Json(result))
}

/// POST /api/v1/analyze/upload
///
/// Multipart fields: `resume` (file) and optional `job_description` (text).
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut resume: Option<(Bytes, DocumentFormat)> = None;
    let mut job_description = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let format = DocumentFormat::detect(field.file_name(), field.content_type())?;
                let bytes = field.bytes().await?;
                resume = Some((bytes, format));
            }
            "job_description" => job_description = field.text().await?,
            _ => {}
        }
    }

    let (bytes, format) =
        resume.ok_or_else(|| AppError::Validation("Missing 'resume' file field".to_string()))?;

    let document = state.extractors.extract(bytes, format).await?;
    info!(?format, chars = document.text.len(), "Uploaded resume converted");

    if document.text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "{format:?} document produced no text"
        )));
    }

    let result = run_analysis(&state, document.text, job_description).await?;
    Ok(Json(result))
}

/// Runs the analysis on the blocking pool; a blank resume is a client error.
async fn run_analysis(
    state: &AppState,
    resume: String,
    job_description: String,
) -> Result<AnalysisResult, AppError> {
    let dictionaries = Arc::clone(&state.dictionaries);
    let today = Utc::now().date_naive();

    let result = tokio::task::spawn_blocking(move || {
        analyze(&dictionaries, &resume, &job_description, today)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow!("analysis task failed: {e}")))?;

    if result.is_empty_input() {
        return Err(AppError::Validation("Resume text is empty".to_string()));
    }

    Ok(result)
}
