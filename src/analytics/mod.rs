// SPDX-License-Identifier: MIT
//! Analytics aggregation for the dashboard.
//!
//! Computes per-feature view/click counts and CTR over a trailing window,
//! plus global totals. The aggregation issues two count queries per feature
//! with no server-side rollup — fine at this product's scale, and the first
//! thing to revisit if feature counts grow.

pub mod model;
pub mod storage;

use chrono::{Duration, Utc};

use crate::error::ApiError;
use crate::storage::{ImpressionType, Storage};
use self::model::{ctr, AnalyticsSummary, FeatureAnalytics};
use self::storage::AnalyticsStorage;

/// Selectable trailing windows, in days.
pub const WINDOWS: [u32; 3] = [7, 30, 90];

pub fn validate_window(days: u32) -> Result<u32, ApiError> {
    if WINDOWS.contains(&days) {
        Ok(days)
    } else {
        Err(ApiError::Validation(
            "Invalid window. Must be 7, 30, or 90 days".to_string(),
        ))
    }
}

/// Summarize impressions for all of a user's features within the window.
pub async fn summarize(
    storage: &Storage,
    user_id: &str,
    days: u32,
) -> Result<AnalyticsSummary, ApiError> {
    let days = validate_window(days)?;
    let since = (Utc::now() - Duration::days(days as i64)).to_rfc3339();

    let features = storage.list_features(user_id).await?;
    let analytics = AnalyticsStorage::new(storage.pool());

    let mut total_views = 0;
    let mut total_clicks = 0;
    let mut per_feature = Vec::with_capacity(features.len());

    for feature in features {
        let views = analytics
            .count_impressions_since(&feature.id, ImpressionType::View, &since)
            .await?;
        let clicks = analytics
            .count_impressions_since(&feature.id, ImpressionType::Click, &since)
            .await?;

        total_views += views;
        total_clicks += clicks;
        per_feature.push(FeatureAnalytics {
            feature_id: feature.id,
            feature_title: feature.title,
            views,
            clicks,
            ctr: ctr(views, clicks),
        });
    }

    Ok(AnalyticsSummary {
        window_days: days,
        total_views,
        total_clicks,
        overall_ctr: ctr(total_views, total_clicks),
        features: per_feature,
    })
}
