//! Impression tracking — the only externally reachable write path that
//! mutates feature view counters.
//!
//! The combined (featureId, uid) lookup is the integrity boundary: without it
//! any visitor could inflate another user's counters by posting a foreign
//! feature id with their own uid (or vice versa).

use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

use crate::error::ApiError;
use crate::storage::{ImpressionType, Storage};

/// Wire format of `POST /api/v1/impressions`. Field names are camelCase as
/// emitted by the embed script; everything is optional at the serde layer so
/// missing fields become a 400 instead of a deserialization reject.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackImpressionRequest {
    #[serde(rename = "featureId", default)]
    pub feature_id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub impression_type: Option<String>,
}

/// Validate, authorize, persist. Returns Ok(()) on a tracked event.
pub async fn track(storage: &Storage, req: TrackImpressionRequest) -> Result<(), ApiError> {
    let (feature_id, uid, raw_type) = match (
        non_empty(req.feature_id),
        non_empty(req.uid),
        non_empty(req.impression_type),
    ) {
        (Some(f), Some(u), Some(t)) => (f, u, t),
        _ => return Err(ApiError::Validation("Missing required fields".to_string())),
    };

    let impression_type = ImpressionType::from_str(&raw_type).map_err(|_| {
        ApiError::Validation("Invalid impression type. Must be 'view' or 'click'".to_string())
    })?;

    // Feature must exist and belong to the claimed user.
    let feature = storage
        .get_feature_owned(&feature_id, &uid)
        .await?
        .ok_or_else(|| ApiError::Authorization("Invalid feature or unauthorized".to_string()))?;

    storage
        .insert_impression(&feature.id, &uid, impression_type)
        .await
        .map_err(|e| {
            warn!("failed to insert impression: {e}");
            ApiError::Internal("Failed to track impression".to_string())
        })?;

    // Counter update is best-effort: a failure here is logged, never surfaced.
    if impression_type == ImpressionType::View {
        if let Err(e) = storage.increment_feature_impressions(&feature.id).await {
            warn!(feature_id = %feature.id, "failed to increment impression counter: {e}");
        }
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
