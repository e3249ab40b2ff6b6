use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::chat::answer_question;
use crate::context::reference_documents;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ClearChatResponse {
    pub status: &'static str,
}

/// POST /api/v1/chat
///
/// Answers a question from the whole reference corpus, remembering the
/// conversation so far.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }
    let llm = state.llm()?;

    let documents = reference_documents(state.config.corpus_paths()).await?;
    let for_index = documents.clone();
    let index = state
        .context
        .get_or_build(false, || async move { Ok(for_index) })
        .await?;

    let answer = answer_question(
        llm.as_ref(),
        state.chat_history.as_ref(),
        &index,
        &documents,
        &request.question,
    )
    .await?;

    Ok(Json(ChatResponse { answer }))
}

/// POST /api/v1/chat/clear
pub async fn handle_clear_chat(
    State(state): State<AppState>,
) -> Result<Json<ClearChatResponse>, AppError> {
    state.chat_history.clear().await?;
    Ok(Json(ClearChatResponse { status: "cleared" }))
}
