//! Impression tracker tests: boundary validation, the owner/feature
//! authorization invariant, and counter behavior.
//!
//! The authorization and type-validation cases double as regression tests
//! against the permissive tracker variant that accepted unknown types and
//! cross-owner (featureId, uid) pairs.

use blastd::error::ApiError;
use blastd::impression::{self, TrackImpressionRequest};
use blastd::storage::{FeatureRow, FeatureType, Storage};
use tempfile::TempDir;

async fn make_storage(dir: &TempDir) -> Storage {
    Storage::new(dir.path()).await.unwrap()
}

async fn seed_feature(storage: &Storage, user_id: &str) -> FeatureRow {
    storage
        .create_feature(user_id, "Dark mode", "Dark mode everywhere", FeatureType::New)
        .await
        .unwrap()
}

fn request(feature_id: &str, uid: &str, impression_type: &str) -> TrackImpressionRequest {
    TrackImpressionRequest {
        feature_id: Some(feature_id.to_string()),
        uid: Some(uid.to_string()),
        impression_type: Some(impression_type.to_string()),
    }
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    let cases = [
        TrackImpressionRequest {
            feature_id: None,
            uid: Some("u1".into()),
            impression_type: Some("view".into()),
        },
        TrackImpressionRequest {
            feature_id: Some("f1".into()),
            uid: None,
            impression_type: Some("view".into()),
        },
        TrackImpressionRequest {
            feature_id: Some("f1".into()),
            uid: Some("u1".into()),
            impression_type: None,
        },
        // Blank strings count as missing too.
        request("", "u1", "view"),
    ];

    for case in cases {
        let err = impression::track(&storage, case).await.unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(ref m) if m == "Missing required fields"),
            "unexpected error: {err:?}"
        );
    }
}

#[tokio::test]
async fn unknown_impression_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let feature = seed_feature(&storage, "u1").await;

    for bad in ["hover", "VIEW", "impression"] {
        let err = impression::track(&storage, request(&feature.id, "u1", bad))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(ref m)
                if m == "Invalid impression type. Must be 'view' or 'click'"),
            "type '{bad}' gave: {err:?}"
        );
    }

    // Nothing was written.
    assert_eq!(storage.count_impressions(&feature.id).await.unwrap(), 0);
}

#[tokio::test]
async fn cross_owner_pair_is_rejected_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let feature = seed_feature(&storage, "owner-a").await;

    // The permissive variant accepted this and let owner-b's visitors inflate
    // owner-a's counters. It must be a 403 with no side effects.
    let err = impression::track(&storage, request(&feature.id, "owner-b", "view"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(ref m) if m == "Invalid feature or unauthorized"));

    assert_eq!(storage.count_impressions(&feature.id).await.unwrap(), 0);
    let row = storage.get_feature(&feature.id).await.unwrap().unwrap();
    assert_eq!(row.impressions, 0);
}

#[tokio::test]
async fn unknown_feature_is_rejected() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;

    let err = impression::track(&storage, request("no-such-feature", "u1", "click"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn view_inserts_row_and_increments_counter() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let feature = seed_feature(&storage, "u1").await;

    impression::track(&storage, request(&feature.id, "u1", "view"))
        .await
        .unwrap();
    impression::track(&storage, request(&feature.id, "u1", "view"))
        .await
        .unwrap();

    assert_eq!(storage.count_impressions(&feature.id).await.unwrap(), 2);
    let row = storage.get_feature(&feature.id).await.unwrap().unwrap();
    assert_eq!(row.impressions, 2);
}

#[tokio::test]
async fn click_inserts_row_without_touching_counter() {
    let dir = TempDir::new().unwrap();
    let storage = make_storage(&dir).await;
    let feature = seed_feature(&storage, "u1").await;

    impression::track(&storage, request(&feature.id, "u1", "click"))
        .await
        .unwrap();

    assert_eq!(storage.count_impressions(&feature.id).await.unwrap(), 1);
    let row = storage.get_feature(&feature.id).await.unwrap().unwrap();
    assert_eq!(row.impressions, 0);
}

// ─── HTTP status mapping ─────────────────────────────────────────────────────

mod http {
    use super::*;
    use blastd::{config::AppConfig, AppContext};
    use std::sync::Arc;

    async fn spawn_server(dir: &TempDir) -> (String, Storage) {
        let config = Arc::new(AppConfig::load(
            None,
            None,
            Some(dir.path().to_path_buf()),
            None,
        ));
        let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
        let ctx = Arc::new(AppContext::new(config, storage.clone()));

        let router = blastd::rest::build_router(ctx);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), (*storage).clone())
    }

    #[tokio::test]
    async fn status_codes_match_the_contract() {
        let dir = TempDir::new().unwrap();
        let (base, storage) = spawn_server(&dir).await;
        let feature = seed_feature(&storage, "u1").await;
        let client = reqwest::Client::new();
        let url = format!("{base}/api/v1/impressions");

        // Missing fields → 400
        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "uid": "u1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Missing required fields");

        // Invalid type → 400
        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "featureId": feature.id, "uid": "u1", "type": "hover" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        // Cross-owner pair → 403
        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "featureId": feature.id, "uid": "u2", "type": "view" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Invalid feature or unauthorized");

        // Valid view → 200 {"success":true}
        let resp = client
            .post(&url)
            .json(&serde_json::json!({ "featureId": feature.id, "uid": "u1", "type": "view" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
    }
}
