//! Embed script endpoint tests: escaping, the feature window, plan gating,
//! and popup suppression plumbing.

use blastd::storage::{FeatureType, Plan, Storage};
use blastd::{config::AppConfig, AppContext};
use std::sync::Arc;
use tempfile::TempDir;

async fn spawn_server(dir: &TempDir) -> (String, Storage) {
    let config = Arc::new(AppConfig::load(
        None,
        None,
        Some(dir.path().to_path_buf()),
        Some("https://widgets.featureblast.io".to_string()),
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
async fn missing_uid_is_a_400() {
    let dir = TempDir::new().unwrap();
    let (base, _storage) = spawn_server(&dir).await;

    let resp = reqwest::get(format!("{base}/embed.js")).await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Missing user ID");
}

#[tokio::test]
async fn serves_javascript_with_tracker_callback() {
    let dir = TempDir::new().unwrap();
    let (base, storage) = spawn_server(&dir).await;
    storage
        .create_feature("u1", "Dark mode", "Dark mode everywhere", FeatureType::New)
        .await
        .unwrap();

    let resp = reqwest::get(format!("{base}/embed.js?uid=u1")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "application/javascript"
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("https://widgets.featureblast.io/api/v1/impressions"));
    assert!(body.contains("\"fb_last_seen\""));
    assert!(body.contains("window.__fbStore"));
    // Suppression: popup only fires when the stored marker differs from the
    // latest feature id, and the marker is updated after showing.
    assert!(body.contains("store.get(LAST_SEEN_KEY) !== latest.id"));
    assert!(body.contains("store.set(LAST_SEEN_KEY, latest.id)"));
}

#[tokio::test]
async fn feature_text_is_entity_escaped() {
    let dir = TempDir::new().unwrap();
    let (base, storage) = spawn_server(&dir).await;
    storage
        .create_feature(
            "u1",
            r#"<script>alert("pwn")</script>"#,
            r#"break "attributes" & tags"#,
            FeatureType::Fix,
        )
        .await
        .unwrap();

    let body = reqwest::get(format!("{base}/embed.js?uid=u1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains(r#"<script>alert("pwn")</script>"#));
    assert!(body.contains("&lt;script&gt;alert(&quot;pwn&quot;)&lt;/script&gt;"));
    assert!(body.contains("break &quot;attributes&quot; &amp; tags"));
}

#[tokio::test]
async fn only_the_five_newest_features_are_included() {
    let dir = TempDir::new().unwrap();
    let (base, storage) = spawn_server(&dir).await;
    for i in 0..6 {
        storage
            .create_feature("u1", &format!("feature-{i}"), "d", FeatureType::Update)
            .await
            .unwrap();
        // Keep created_at strictly increasing.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let body = reqwest::get(format!("{base}/embed.js?uid=u1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains("feature-0"), "oldest feature leaked in");
    for i in 1..6 {
        assert!(body.contains(&format!("feature-{i}")));
    }
    // Newest first: the popup targets FEATURES[0].
    let newest = body.find("feature-5").unwrap();
    let older = body.find("feature-1").unwrap();
    assert!(newest < older);
}

#[tokio::test]
async fn free_plan_forces_default_color_and_branding() {
    let dir = TempDir::new().unwrap();
    let (base, storage) = spawn_server(&dir).await;
    storage
        .create_feature("u1", "t", "d", FeatureType::New)
        .await
        .unwrap();

    // No settings row at all — defaults apply.
    let body = reqwest::get(format!("{base}/embed.js?uid=u1&color=%23ff0000"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("#3b82f6"));
    assert!(!body.contains("#ff0000"));
    assert!(body.contains("SHOW_BRANDING = true"));

    // Even with saved customization, the free plan is ignored.
    storage
        .upsert_user_settings("u1", "#00ff00", true, Plan::Free)
        .await
        .unwrap();
    let body = reqwest::get(format!("{base}/embed.js?uid=u1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("#3b82f6"));
    assert!(body.contains("SHOW_BRANDING = true"));
}

#[tokio::test]
async fn paid_plan_honors_override_saved_color_and_branding() {
    let dir = TempDir::new().unwrap();
    let (base, storage) = spawn_server(&dir).await;
    storage
        .create_feature("u1", "t", "d", FeatureType::New)
        .await
        .unwrap();
    storage
        .upsert_user_settings("u1", "#00ff00", true, Plan::Pro)
        .await
        .unwrap();

    // Query override wins.
    let body = reqwest::get(format!("{base}/embed.js?uid=u1&color=%23ff0000"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("#ff0000"));
    assert!(body.contains("SHOW_BRANDING = false"));

    // Without an override, the saved color applies.
    let body = reqwest::get(format!("{base}/embed.js?uid=u1"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("#00ff00"));

    // An invalid override falls back to the saved color.
    let body = reqwest::get(format!("{base}/embed.js?uid=u1&color=purple"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("#00ff00"));
    assert!(!body.contains("purple"));
}
