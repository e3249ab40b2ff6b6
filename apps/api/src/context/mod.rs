// Context module: the corpus index, its shared cache, and the HTTP surface
// for inspecting and extending the reference material.

pub mod cache;
pub mod handlers;
pub mod index;

use std::sync::Arc;

use anyhow::Context as _;

use crate::corpus::{self, CorpusPaths, Document};
use crate::errors::AppError;
use crate::state::AppState;
use index::ContextIndex;

/// Loads the reference corpus off the async runtime.
pub async fn reference_documents(paths: CorpusPaths) -> anyhow::Result<Vec<Document>> {
    let documents = tokio::task::spawn_blocking(move || corpus::load_reference_corpus(&paths))
        .await
        .context("corpus loader panicked")??;
    Ok(documents)
}

/// The shared index, rebuilt from disk when missing or when `force_refresh`.
pub async fn current_index(
    state: &AppState,
    force_refresh: bool,
) -> Result<Arc<ContextIndex>, AppError> {
    let paths = state.config.corpus_paths();
    state
        .context
        .get_or_build(force_refresh, || reference_documents(paths))
        .await
        .map_err(AppError::Internal)
}
