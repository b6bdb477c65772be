use async_trait::async_trait;
use hullmedia_core::models::{MediaRecord, NewMediaRecord};
use hullmedia_core::AppError;
use sqlx::PgPool;

use super::catalog::MediaCatalog;

const MEDIA_COLUMNS: &str = "id, original_filename, content_type, size_bytes, sha256, width, \
     height, storage_key, association_id, status, created_at";

/// PostgreSQL-backed media catalog
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaCatalog for MediaRepository {
    #[tracing::instrument(skip(self, record), fields(storage_key = %record.storage_key))]
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        let created = sqlx::query_as::<_, MediaRecord>(&format!(
            r#"
            INSERT INTO media (
                original_filename, content_type, size_bytes, sha256,
                width, height, storage_key, association_id, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'ready')
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(&record.original_filename)
        .bind(&record.content_type)
        .bind(record.size_bytes)
        .bind(&record.sha256)
        .bind(record.width)
        .bind(record.height)
        .bind(&record.storage_key)
        .bind(record.association_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(media_id = created.id, "Media record inserted");

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<MediaRecord>, AppError> {
        let row = sqlx::query_as::<_, MediaRecord>(&format!(
            "SELECT {} FROM media WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, association_id: Option<i64>) -> Result<Vec<MediaRecord>, AppError> {
        let rows = sqlx::query_as::<_, MediaRecord>(&format!(
            r#"
            SELECT {}
            FROM media
            WHERE ($1::BIGINT IS NULL OR association_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
            MEDIA_COLUMNS
        ))
        .bind(association_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
