// rest/routes/impressions.rs — the public impression-tracking endpoint.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::impression::{self, TrackImpressionRequest};
use crate::AppContext;

pub async fn track(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<TrackImpressionRequest>,
) -> Result<Json<Value>, ApiError> {
    impression::track(&ctx.storage, body).await?;
    Ok(Json(json!({ "success": true })))
}
