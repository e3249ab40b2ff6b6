use aws_sdk_s3::primitives::ByteStream;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::generation::GenerationRow;
use crate::render::RenderedDeck;

/// S3 key for a rendered deck.
pub fn deck_key(id: Uuid) -> String {
    format!("decks/{id}.json")
}

/// Uploads the rendered deck as JSON, then records the generation.
pub async fn store_generation(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    id: Uuid,
    prompt: &str,
    markdown: &str,
    rendered: &RenderedDeck,
) -> Result<GenerationRow, AppError> {
    let key = deck_key(id);
    let body = serde_json::to_vec(rendered).map_err(|e| AppError::Internal(e.into()))?;

    s3.put_object()
        .bucket(s3_bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    let row = sqlx::query_as::<_, GenerationRow>(
        r#"
        INSERT INTO generations (id, prompt, markdown, deck_key, slide_count)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, prompt, markdown, deck_key, slide_count, created_at
        "#,
    )
    .bind(id)
    .bind(prompt)
    .bind(markdown)
    .bind(&key)
    .bind(rendered.deck.slides.len() as i32)
    .fetch_one(pool)
    .await?;

    info!("Stored generation {id} ({} slides) at {key}", row.slide_count);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_key_layout() {
        let id = Uuid::nil();
        assert_eq!(deck_key(id), "decks/00000000-0000-0000-0000-000000000000.json");
    }
}
