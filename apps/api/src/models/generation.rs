use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationRow {
    pub id: Uuid,
    pub prompt: String,
    pub markdown: String,
    pub deck_key: String,
    pub slide_count: i32,
    pub created_at: DateTime<Utc>,
}
