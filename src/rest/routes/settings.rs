// rest/routes/settings.rs — per-owner embed customization settings.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::embed::is_valid_hex_color;
use crate::error::ApiError;
use crate::rest::auth::CurrentUser;
use crate::storage::{Plan, UserSettingsRow};
use crate::AppContext;

/// Partial update — absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub primary_color: Option<String>,
    pub hide_branding: Option<bool>,
    pub plan: Option<Plan>,
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<UserSettingsRow>, ApiError> {
    let settings = ctx.storage.get_user_settings_or_default(&uid).await?;
    Ok(Json(settings))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<UserSettingsRow>, ApiError> {
    let current = ctx.storage.get_user_settings_or_default(&uid).await?;

    let plan = body.plan.unwrap_or_else(|| current.plan());
    let primary_color = match body.primary_color {
        Some(color) => {
            if !is_valid_hex_color(&color) {
                return Err(ApiError::Validation(
                    "Primary color must be a hex value like #3b82f6".to_string(),
                ));
            }
            color
        }
        None => current.primary_color,
    };
    let hide_branding = body.hide_branding.unwrap_or(current.hide_branding);

    let saved = ctx
        .storage
        .upsert_user_settings(&uid, &primary_color, hide_branding, plan)
        .await?;
    Ok(Json(saved))
}
