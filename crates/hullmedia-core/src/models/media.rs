use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Lifecycle status of a catalog record.
///
/// Records are only created after their stored bytes passed validation, so `Ready` is the
/// single status written today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Ready,
}

/// A validated, durably stored image and its catalog metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct MediaRecord {
    pub id: i64,
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    /// Upper-case hex SHA-256 of the stored bytes
    pub sha256: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub storage_key: String,
    /// Owning entity (e.g. a vessel part) the image is attached to
    pub association_id: Option<i64>,
    pub status: MediaStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when cataloguing a freshly stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMediaRecord {
    pub original_filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub storage_key: String,
    pub association_id: Option<i64>,
}

impl NewMediaRecord {
    /// Materialize the record once the catalog assigned an id.
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> MediaRecord {
        MediaRecord {
            id,
            original_filename: self.original_filename,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            sha256: self.sha256,
            width: self.width,
            height: self.height,
            storage_key: self.storage_key,
            association_id: self.association_id,
            status: MediaStatus::Ready,
            created_at,
        }
    }
}

#[cfg(all(test, feature = "sqlx"))]
mod tests {
    use super::*;

    fn row_decodable<T: for<'r> FromRow<'r, sqlx::postgres::PgRow>>() {}

    fn column_type<T: sqlx::Type<sqlx::Postgres>>() {}

    #[test]
    fn test_models_map_to_postgres_rows() {
        row_decodable::<MediaRecord>();
        column_type::<MediaStatus>();
    }
}
