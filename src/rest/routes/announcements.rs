// rest/routes/announcements.rs — announcement generation endpoint.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::announce::{AnnouncementRequest, AnnouncementSet, Generator};
use crate::error::ApiError;
use crate::AppContext;

/// Four channel variants from one feature. No persistence — the caller
/// decides what to do with the copy.
pub async fn generate(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<AnnouncementRequest>,
) -> Result<Json<AnnouncementSet>, ApiError> {
    let generator = Generator::from_config(&ctx.config.ai)?;
    let set = generator.generate(&body).await?;
    Ok(Json(set))
}
