pub mod analytics;
pub mod announce;
pub mod config;
pub mod embed;
pub mod error;
pub mod impression;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::AppConfig;
use storage::Storage;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<AppConfig>, storage: Arc<Storage>) -> Self {
        Self {
            config,
            storage,
            started_at: std::time::Instant::now(),
        }
    }
}
