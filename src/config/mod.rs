use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 4400;
const DEFAULT_AI_BASE_URL: &str = "https://ai.gateway.lovable.dev";
const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".blastd"),
        None => PathBuf::from(".blastd"),
    }
}

// ─── AiConfig ─────────────────────────────────────────────────────────────────

/// Completion gateway configuration (`[ai]` in config.toml).
///
/// The API key is only required when the announcement endpoint is actually
/// hit; the daemon starts fine without one.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the OpenAI-compatible completion gateway.
    pub base_url: String,
    /// Bearer token for the gateway. None = announcement generation disabled.
    pub api_key: Option<String>,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_AI_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

// ─── File config ─────────────────────────────────────────────────────────────

/// On-disk layout of `{data_dir}/config.toml`. Every field is optional;
/// missing fields fall back to defaults, env vars and CLI flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    port: Option<u16>,
    bind_address: Option<String>,
    public_base_url: Option<String>,
    ai: AiConfig,
}

// ─── AppConfig ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// REST server port.
    pub port: u16,
    /// Bind address (default 127.0.0.1; use 0.0.0.0 behind a gateway).
    pub bind_address: String,
    /// Data directory holding the SQLite database and config.toml.
    pub data_dir: PathBuf,
    /// Public base URL of this daemon, embedded into the emitted script so
    /// visiting browsers can reach the impression endpoint.
    pub public_base_url: String,
    pub ai: AiConfig,
}

impl AppConfig {
    /// Merge defaults < config.toml < explicit overrides (CLI/env).
    pub fn load(
        port: Option<u16>,
        bind_address: Option<String>,
        data_dir: Option<PathBuf>,
        public_base_url: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let file = read_file_config(&data_dir.join("config.toml"));

        let port = port.or(file.port).unwrap_or(DEFAULT_PORT);
        let bind_address = bind_address
            .or(file.bind_address)
            .unwrap_or_else(default_bind_address);
        let public_base_url = public_base_url
            .or(file.public_base_url)
            .unwrap_or_else(|| format!("http://{bind_address}:{port}"));

        let mut ai = file.ai;
        if let Ok(key) = std::env::var("BLASTD_AI_API_KEY") {
            if !key.is_empty() {
                ai.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("BLASTD_AI_BASE_URL") {
            if !url.is_empty() {
                ai.base_url = url;
            }
        }

        Self {
            port,
            bind_address,
            data_dir,
            public_base_url,
            ai,
        }
    }
}

fn read_file_config(path: &Path) -> FileConfig {
    match std::fs::read_to_string(path) {
        Ok(raw) => match toml::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("invalid config file '{}': {e} — using defaults", path.display());
                FileConfig::default()
            }
        },
        Err(_) => FileConfig::default(),
    }
}
