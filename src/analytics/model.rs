// SPDX-License-Identifier: MIT
//! Analytics data models — serialisable types returned by the analytics API.

use serde::{Deserialize, Serialize};

/// Per-feature counts within the selected trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAnalytics {
    pub feature_id: String,
    pub feature_title: String,
    pub views: i64,
    pub clicks: i64,
    /// Click-through rate: clicks / views × 100, rounded to two decimals.
    /// Zero when there are no views.
    pub ctr: f64,
}

/// Window totals plus the per-feature breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub window_days: u32,
    pub total_views: i64,
    pub total_clicks: i64,
    pub overall_ctr: f64,
    pub features: Vec<FeatureAnalytics>,
}

/// CTR as a percentage, rounded to two decimals. Zero views is zero, not NaN.
pub fn ctr(views: i64, clicks: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    let raw = clicks as f64 / views as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
