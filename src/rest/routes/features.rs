// rest/routes/features.rs — feature CRUD for the dashboard.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::rest::auth::CurrentUser;
use crate::storage::{FeatureRow, FeatureType};
use crate::AppContext;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub feature_type: String,
}

/// Boundary validation: trim, length limits, type enum. Mirrors what the
/// dashboard form enforces so the API holds even without it.
pub fn validate(req: &CreateFeatureRequest) -> Result<(String, String, FeatureType), ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::Validation(
            "Title must be less than 100 characters".to_string(),
        ));
    }

    let description = req.description.trim().to_string();
    if description.is_empty() {
        return Err(ApiError::Validation("Description is required".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::Validation(
            "Description must be less than 1000 characters".to_string(),
        ));
    }

    let feature_type = FeatureType::from_str(&req.feature_type)
        .map_err(|_| ApiError::Validation("Please select a valid feature type".to_string()))?;

    Ok((title, description, feature_type))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Json(body): Json<CreateFeatureRequest>,
) -> Result<Json<FeatureRow>, ApiError> {
    let (title, description, feature_type) = validate(&body)?;
    let row = ctx
        .storage
        .create_feature(&uid, &title, &description, feature_type)
        .await?;
    Ok(Json(row))
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let features = ctx.storage.list_features(&uid).await?;
    Ok(Json(json!({ "features": features })))
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FeatureRow>, ApiError> {
    ctx.storage
        .get_feature_owned(&id, &uid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Feature not found".to_string()))
}
