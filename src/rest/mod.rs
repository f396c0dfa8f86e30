// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only unless bound elsewhere behind a gateway.
//
// Endpoints:
//   GET    /api/v1/health
//   POST   /api/v1/announcements        (public)
//   POST   /api/v1/impressions          (public — called by embedded sites)
//   GET    /embed.js                    (public — the embeddable script)
//   GET    /api/v1/features             (owner-scoped)
//   POST   /api/v1/features
//   GET    /api/v1/features/{id}
//   GET    /api/v1/team
//   POST   /api/v1/team
//   DELETE /api/v1/team/{id}
//   GET    /api/v1/settings
//   PUT    /api/v1/settings
//   GET    /api/v1/analytics?days=7|30|90

pub mod auth;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(routes::health::health))
        // Public handlers — reached by embedded sites and visiting browsers
        .route(
            "/api/v1/announcements",
            post(routes::announcements::generate),
        )
        .route("/api/v1/impressions", post(routes::impressions::track))
        .route("/embed.js", get(routes::embed::script))
        // Owner-scoped dashboard API
        .route(
            "/api/v1/features",
            get(routes::features::list).post(routes::features::create),
        )
        .route("/api/v1/features/{id}", get(routes::features::get))
        .route(
            "/api/v1/team",
            get(routes::team::list).post(routes::team::invite),
        )
        .route("/api/v1/team/{id}", delete(routes::team::remove))
        .route(
            "/api/v1/settings",
            get(routes::settings::get).put(routes::settings::update),
        )
        .route("/api/v1/analytics", get(routes::analytics::summary))
        // The embed script and tracker are called cross-origin by design.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
