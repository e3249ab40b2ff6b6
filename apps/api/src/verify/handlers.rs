use anyhow::Context as _;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;

use crate::context::handlers::safe_file_name;
use crate::context::reference_documents;
use crate::corpus::UNSUPPORTED_FORMAT;
use crate::errors::AppError;
use crate::state::AppState;
use crate::verify::{extract_upload, verify_spec, VerificationReport};

/// POST /api/v1/verify
///
/// Multipart form with a `file` part holding the spec to check. The spec is
/// compared against every reference document on disk.
pub async fn handle_verify(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VerificationReport>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .and_then(safe_file_name)
            .ok_or_else(|| AppError::Validation("file part needs a filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
        upload = Some((filename, data));
    }
    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("Missing file part".to_string()))?;
    let llm = state.llm()?;

    let name = filename.clone();
    let spec = tokio::task::spawn_blocking(move || extract_upload(&name, &data))
        .await
        .context("spec extraction panicked")??;
    if spec.starts_with(UNSUPPORTED_FORMAT) {
        return Err(AppError::Validation(spec));
    }
    if spec.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Could not extract text from {filename}"
        )));
    }

    let documents = reference_documents(state.config.corpus_paths()).await?;
    let report = verify_spec(llm.as_ref(), &filename, &spec, &documents).await?;
    Ok(Json(report))
}
