// SPDX-License-Identifier: MIT
//! Analytics queries — windowed impression counts over the shared pool.

use sqlx::SqlitePool;

use crate::storage::ImpressionType;

pub struct AnalyticsStorage {
    pool: SqlitePool,
}

impl AnalyticsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Count impressions of one type for one feature since an RFC 3339
    /// cutoff. Timestamps are stored RFC 3339, so string comparison orders
    /// correctly.
    pub async fn count_impressions_since(
        &self,
        feature_id: &str,
        impression_type: ImpressionType,
        since: &str,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM impressions
             WHERE feature_id = ? AND impression_type = ? AND created_at >= ?",
        )
        .bind(feature_id)
        .bind(impression_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }
}
