// rest/routes/embed.rs — serves the embeddable client script.
//
// Unlike the JSON API this endpoint answers in plain text / JavaScript, so
// errors are rendered as plain-text bodies rather than the ApiError shape.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::embed::{effective_color, render_script, EmbedParams};
use crate::AppContext;

/// Number of recent features the widget shows.
const FEATURE_WINDOW: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct EmbedQuery {
    /// Owner id. `data-uid` is accepted for script tags that forward their
    /// data attributes verbatim.
    #[serde(alias = "data-uid")]
    pub uid: Option<String>,
    #[serde(alias = "data-color")]
    pub color: Option<String>,
}

pub async fn script(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<EmbedQuery>,
) -> Response {
    let Some(uid) = query
        .uid
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        return (StatusCode::BAD_REQUEST, "Missing user ID").into_response();
    };

    let settings = match ctx.storage.get_user_settings_or_default(uid).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("error fetching user settings: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching features").into_response();
        }
    };

    let features = match ctx.storage.latest_features(uid, FEATURE_WINDOW).await {
        Ok(features) => features,
        Err(e) => {
            error!("error fetching features: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching features").into_response();
        }
    };

    let plan = settings.plan();
    let color = effective_color(plan, query.color.as_deref(), &settings.primary_color);
    // Branding can only be hidden on a paid plan.
    let show_branding = plan.is_free() || !settings.hide_branding;
    let track_url = format!(
        "{}/api/v1/impressions",
        ctx.config.public_base_url.trim_end_matches('/')
    );

    let body = render_script(&EmbedParams {
        uid,
        color: &color,
        track_url: &track_url,
        features: &features,
        show_branding,
    });

    (
        [(header::CONTENT_TYPE, "application/javascript")],
        body,
    )
        .into_response()
}
