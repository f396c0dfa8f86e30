// rest/routes/team.rs — team member invites for an owner.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::rest::auth::CurrentUser;
use crate::storage::{Role, TeamMemberRow};
use crate::AppContext;

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Editor
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let members = ctx.storage.list_team_members(&uid).await?;
    Ok(Json(json!({ "members": members })))
}

pub async fn invite(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Json(body): Json<InviteRequest>,
) -> Result<Json<TeamMemberRow>, ApiError> {
    let email = body.email.trim().to_string();
    if email.is_empty() {
        return Err(ApiError::Validation(
            "Please enter an email address".to_string(),
        ));
    }

    match ctx.storage.invite_team_member(&uid, &email, body.role).await {
        Ok(row) => Ok(Json(row)),
        // Unique per owner — the same address can be invited by other owners.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::Validation(
            "This email is already invited".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove(
    State(ctx): State<Arc<AppContext>>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if ctx.storage.remove_team_member(&id, &uid).await? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ApiError::NotFound("Team member not found".to_string()))
    }
}
