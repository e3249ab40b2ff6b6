use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QaHistoryRow {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}
