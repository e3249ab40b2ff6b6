use std::path::Path;

use anyhow::Context as _;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::context::current_index;
use crate::context::index::{CorpusStats, FeatureMention, TermCount};
use crate::corpus::{list_documents, DESCRIPTION_SUFFIX, TEMPLATE_SUFFIX};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub gdds: Vec<String>,
    pub slides: Vec<String>,
    pub edge_cases: Option<String>,
    pub context_uploads: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: &'static str,
    pub stats: CorpusStats,
    pub features: Vec<FeatureMention>,
    pub terminology: Vec<TermCount>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub filename: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/files
///
/// Lists the reference material currently on disk.
pub async fn handle_list_files(
    State(state): State<AppState>,
) -> Result<Json<FilesResponse>, AppError> {
    let paths = state.config.corpus_paths();
    let response = tokio::task::spawn_blocking(move || -> anyhow::Result<FilesResponse> {
        let names = |dir: &Path| -> anyhow::Result<Vec<String>> {
            Ok(list_documents(dir)?
                .into_iter()
                .map(|d| d.filename)
                .collect())
        };
        Ok(FilesResponse {
            gdds: names(&paths.gdds)?,
            slides: names(&paths.slides)?
                .into_iter()
                .filter(|n| !n.ends_with(TEMPLATE_SUFFIX))
                .collect(),
            edge_cases: names(&paths.edge_cases)?.into_iter().next(),
            context_uploads: names(&paths.context_uploads)?
                .into_iter()
                .filter(|n| !n.ends_with(DESCRIPTION_SUFFIX))
                .collect(),
        })
    })
    .await
    .context("file listing panicked")??;

    Ok(Json(response))
}

/// POST /api/v1/context/refresh
///
/// Rebuilds the corpus index from disk and replaces the cached copy.
pub async fn handle_refresh_context(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let index = current_index(&state, true).await?;
    Ok(Json(RefreshResponse {
        status: "success",
        stats: index.stats.clone(),
        features: index.features.clone(),
        terminology: index.terminology.clone(),
    }))
}

/// POST /api/v1/context/upload
///
/// Multipart form with a `file` part and an optional `description` part.
/// The file lands in `context_uploads/` with a `.desc.txt` sidecar.
pub async fn handle_upload_context(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
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
            Some("description") => {
                description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read description: {e}")))?;
            }
            _ => {}
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::Validation("Missing file part".to_string()))?;
    if filename.ends_with(DESCRIPTION_SUFFIX) {
        return Err(AppError::Validation(format!(
            "Filenames ending in {DESCRIPTION_SUFFIX} are reserved"
        )));
    }

    let dir = state.config.corpus_paths().context_uploads;
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(&filename);
    tokio::fs::write(&path, &data)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    let desc_path = dir.join(format!("{filename}{DESCRIPTION_SUFFIX}"));
    tokio::fs::write(&desc_path, description.as_bytes())
        .await
        .with_context(|| format!("writing {}", desc_path.display()))?;

    info!("Saved context upload {filename} ({} bytes)", data.len());
    Ok(Json(UploadResponse {
        status: "success",
        filename,
    }))
}

/// Final path component of a client-supplied name; rejects names that
/// would escape the uploads directory or hide the file.
pub(crate) fn safe_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw).file_name()?.to_str()?.trim();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}
