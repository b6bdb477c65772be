//! Completion registry
//!
//! Maps a client correlation id to the outcome of a server-side upload completion. Entries
//! expire after a fixed TTL; a missing entry means either "not finished yet" or "expired".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hullmedia_core::models::UploadResult;
use hullmedia_core::AppError;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait UploadResultRegistry: Send + Sync {
    /// Store (or overwrite) the outcome for a correlation id
    async fn set(&self, correlation_id: Uuid, result: UploadResult) -> Result<(), AppError>;

    /// Outcome if present and not expired
    async fn try_get(&self, correlation_id: Uuid) -> Result<Option<UploadResult>, AppError>;

    /// Drop expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, AppError>;
}

/// In-process registry
pub struct InMemoryUploadResultRegistry {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, (UploadResult, Instant)>>,
}

impl InMemoryUploadResultRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UploadResultRegistry for InMemoryUploadResultRegistry {
    async fn set(&self, correlation_id: Uuid, result: UploadResult) -> Result<(), AppError> {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .lock()
            .await
            .insert(correlation_id, (result, expires_at));
        Ok(())
    }

    async fn try_get(&self, correlation_id: Uuid) -> Result<Option<UploadResult>, AppError> {
        let mut entries = self.entries.lock().await;
        match entries.get(&correlation_id) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(&correlation_id);
                Ok(None)
            }
            Some((result, _)) => Ok(Some(result.clone())),
            None => Ok(None),
        }
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

/// PostgreSQL-backed registry shared by every server instance
#[derive(Clone)]
pub struct UploadResultRepository {
    pool: PgPool,
    ttl: Duration,
}

impl UploadResultRepository {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    fn expires_at(&self) -> Result<DateTime<Utc>, AppError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AppError::Internal(format!("Invalid upload result TTL: {}", e)))?;
        Ok(Utc::now() + ttl)
    }
}

#[async_trait]
impl UploadResultRegistry for UploadResultRepository {
    async fn set(&self, correlation_id: Uuid, result: UploadResult) -> Result<(), AppError> {
        let (media_id, reason) = match &result {
            UploadResult::Registered { media_id } => (Some(*media_id), None),
            UploadResult::Rejected { reason } => (None, Some(reason.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO upload_results (correlation_id, outcome, media_id, reason, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (correlation_id) DO UPDATE
            SET outcome = EXCLUDED.outcome,
                media_id = EXCLUDED.media_id,
                reason = EXCLUDED.reason,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(correlation_id)
        .bind(result.kind())
        .bind(media_id)
        .bind(reason)
        .bind(self.expires_at()?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn try_get(&self, correlation_id: Uuid) -> Result<Option<UploadResult>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT outcome, media_id, reason
            FROM upload_results
            WHERE correlation_id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let outcome: String = row.try_get("outcome")?;
        let media_id: Option<i64> = row.try_get("media_id")?;
        let reason: Option<String> = row.try_get("reason")?;

        match (outcome.as_str(), media_id) {
            ("registered", Some(media_id)) => Ok(Some(UploadResult::Registered { media_id })),
            ("rejected", _) => Ok(Some(UploadResult::Rejected {
                reason: reason.unwrap_or_default(),
            })),
            _ => Err(AppError::Internal(format!(
                "Malformed upload result row for {}",
                correlation_id
            ))),
        }
    }

    async fn purge_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM upload_results WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let registry = InMemoryUploadResultRegistry::new(Duration::from_secs(60));
        let id = Uuid::new_v4();

        assert!(registry.try_get(id).await.unwrap().is_none());

        registry
            .set(id, UploadResult::Registered { media_id: 5 })
            .await
            .unwrap();
        assert_eq!(
            registry.try_get(id).await.unwrap(),
            Some(UploadResult::Registered { media_id: 5 })
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let registry = InMemoryUploadResultRegistry::new(Duration::from_secs(60));
        let id = Uuid::new_v4();
        registry
            .set(id, UploadResult::Registered { media_id: 1 })
            .await
            .unwrap();
        registry
            .set(
                id,
                UploadResult::Rejected {
                    reason: "bad".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            registry.try_get(id).await.unwrap(),
            Some(UploadResult::Rejected {
                reason: "bad".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let registry = InMemoryUploadResultRegistry::new(Duration::from_millis(50));
        let id = Uuid::new_v4();
        registry
            .set(id, UploadResult::Registered { media_id: 9 })
            .await
            .unwrap();
        assert!(registry.try_get(id).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(registry.try_get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let registry = InMemoryUploadResultRegistry::new(Duration::from_millis(30));
        for media_id in 0..3 {
            registry
                .set(Uuid::new_v4(), UploadResult::Registered { media_id })
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(registry.purge_expired().await.unwrap(), 3);
        assert_eq!(registry.purge_expired().await.unwrap(), 0);
    }
}
