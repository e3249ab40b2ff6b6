use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::context::cache::ContextCache;
use crate::errors::AppError;
use crate::history::HistoryStore;
use crate::llm_client::TextCompletion;
use crate::render::images::ImageFetcher;
use crate::render::mapper::SlideMap;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// `None` when no API key is configured; requests needing it fail with 401.
    pub llm: Option<Arc<dyn TextCompletion>>,
    pub context: Arc<ContextCache>,
    /// Answers to clarifying questions.
    pub history: Arc<dyn HistoryStore>,
    /// Corpus chat conversation.
    pub chat_history: Arc<dyn HistoryStore>,
    pub images: Arc<dyn ImageFetcher>,
    pub slide_map: Arc<SlideMap>,
    pub config: Config,
}

impl AppState {
    pub fn llm(&self) -> Result<Arc<dyn TextCompletion>, AppError> {
        self.llm
            .clone()
            .ok_or_else(|| AppError::Configuration("ANTHROPIC_API_KEY is not set".to_string()))
    }
}
