//! Axum route handlers for the Generation API.

use anyhow::Context as _;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::context::current_index;
use crate::errors::AppError;
use crate::figma::FigmaClient;
use crate::generation::clarify::{analyze_prompt, style_context};
use crate::generation::generator::{
    generate_spec, load_template, strip_html_tags, DesignSource, GenerateRequest,
    ReferenceMaterial,
};
use crate::generation::persist::store_generation;
use crate::history::QaRecord;
use crate::render::{render_markdown, SlidePlacement};
use crate::selection::find_conflicts;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ContextStats {
    pub total_specs: usize,
    pub features_found: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub questions: Vec<String>,
    pub conflicts: Vec<String>,
    pub context_stats: ContextStats,
}

#[derive(Debug, Deserialize)]
pub struct SaveQaRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SaveQaResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub id: Uuid,
    /// Generated markdown with HTML tags stripped.
    pub gdd: String,
    pub conflicts: Vec<String>,
    pub documents_used: Vec<String>,
    /// Characters of reference context that reached the prompt.
    pub context_chars: usize,
    pub deck_key: String,
    pub slide_count: i32,
    pub placements: Vec<SlidePlacement>,
    pub created_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Flags overlaps with existing features and asks the model for clarifying
/// questions. An empty question list means the request is ready to generate.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    let llm = state.llm()?;

    let index = current_index(&state, false).await?;
    let conflicts = find_conflicts(&request.prompt, &index);
    let history = state.history.load().await?;

    let questions =
        analyze_prompt(llm.as_ref(), &request.prompt, &history, &style_context(&index)).await?;

    Ok(Json(AnalyzeResponse {
        questions,
        conflicts,
        context_stats: ContextStats {
            total_specs: index.stats.document_count,
            features_found: index.features.len(),
        },
    }))
}

/// POST /api/v1/qa
///
/// Records an answered clarifying question for future analyses.
pub async fn handle_save_qa(
    State(state): State<AppState>,
    Json(request): Json<SaveQaRequest>,
) -> Result<Json<SaveQaResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    state
        .history
        .append(QaRecord {
            question: request.question,
            answer: request.answer,
        })
        .await?;

    Ok(Json(SaveQaResponse { status: "saved" }))
}

/// POST /api/v1/generate
///
/// Full pipeline: reference material → index → optional Figma export →
/// model → deck rendering → S3 + generations row.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    let llm = state.llm()?;

    let paths = state.config.corpus_paths();
    let material = tokio::task::spawn_blocking(move || ReferenceMaterial::load(&paths))
        .await
        .context("corpus loader panicked")?
        .map_err(|e| AppError::Internal(e.into()))?;
    info!("Loaded {} reference documents", material.documents.len());

    let documents = material.documents.clone();
    let index = state
        .context
        .get_or_build(false, || async move { Ok(documents) })
        .await?;

    let design = match request.figma_source() {
        Some((token, url)) => match FigmaClient::new(token.to_string()) {
            Ok(client) => DesignSource::fetch(&client, url).await,
            Err(e) => DesignSource::Failed(e.to_string()),
        },
        None => DesignSource::None,
    };

    let spec = generate_spec(
        llm.as_ref(),
        &request.prompt,
        &index,
        &material,
        &design,
        &state.config.context_budget(),
    )
    .await?;

    let template_path = state.config.template_path.clone();
    let slides_dir = state.config.corpus_paths().slides;
    let template =
        tokio::task::spawn_blocking(move || load_template(template_path.as_deref(), &slides_dir))
            .await
            .context("template loader panicked")?;

    let rendered = render_markdown(
        template,
        &spec.markdown,
        &state.slide_map,
        state.images.as_ref(),
    )
    .await;

    let id = Uuid::new_v4();
    let row = store_generation(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        id,
        &request.prompt,
        &spec.markdown,
        &rendered,
    )
    .await?;

    Ok(Json(GenerateResponse {
        id: row.id,
        gdd: strip_html_tags(&spec.markdown),
        conflicts: spec.conflicts,
        documents_used: spec.documents_used,
        context_chars: spec.context_chars,
        deck_key: row.deck_key,
        slide_count: row.slide_count,
        placements: rendered.placements,
        created_at: row.created_at,
    }))
}
