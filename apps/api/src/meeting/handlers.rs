use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::meeting::enhance;

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub meeting_data: String,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub enhanced_data: String,
}

/// POST /api/v1/meeting/enhance
///
/// Fills meeting notes out to the full spec outline. No model call.
pub async fn handle_enhance_meeting_data(
    Json(request): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, AppError> {
    if request.meeting_data.trim().is_empty() {
        return Err(AppError::Validation("meeting_data cannot be empty".to_string()));
    }
    let enhanced_data = enhance(&request.meeting_data);
    info!(
        "Enhanced meeting notes: {} -> {} chars",
        request.meeting_data.len(),
        enhanced_data.len()
    );
    Ok(Json(EnhanceResponse { enhanced_data }))
}
