// rest/routes/analytics.rs — windowed impression analytics.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::{self, model::AnalyticsSummary};
use crate::error::ApiError;
use crate::rest::auth::CurrentUser;
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}

pub async fn summary(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let summary = analytics::summarize(&ctx.storage, &uid, query.days).await?;
    Ok(Json(summary))
}
