use std::path::PathBuf;
use std::time::Duration;

use signage_core::generation::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
use signage_core::storage::DEFAULT_MAX_UPLOAD_BYTES;
use signage_core::DbId;
use signage_fal::FalConfig;
use signage_pipeline::RunnerSettings;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory holding uploaded and generated files (default: `storage`).
    pub storage_root: PathBuf,
    /// URL path the storage directory is served under (default: `/files`).
    pub public_files_prefix: String,
    /// Largest accepted upload in bytes (default: 20 MiB).
    pub max_upload_bytes: u64,
    /// Generation API connection settings.
    pub fal: FalConfig,
    /// Interval between queue status checks (default: 2 s).
    pub poll_interval: Duration,
    /// Give up on a queued generation after this long (default: 600 s).
    pub poll_timeout: Duration,
    /// User id attributed to every request until real auth exists (default: `1`).
    pub stub_user_id: DbId,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `STORAGE_ROOT`                  | `storage`               |
    /// | `PUBLIC_FILES_PREFIX`           | `/files`                |
    /// | `MAX_UPLOAD_BYTES`              | `20971520`              |
    /// | `GENERATION_POLL_INTERVAL_MS`   | `2000`                  |
    /// | `GENERATION_POLL_TIMEOUT_SECS`  | `600`                   |
    /// | `STUB_USER_ID`                  | `1`                     |
    ///
    /// `FAL_*` variables are read by [`FalConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_root =
            PathBuf::from(std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage".into()));

        let public_files_prefix =
            std::env::var("PUBLIC_FILES_PREFIX").unwrap_or_else(|_| "/files".into());

        let max_upload_bytes: u64 = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid u64"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let poll_interval = std::env::var("GENERATION_POLL_INTERVAL_MS")
            .map(|v| parse_poll_interval_ms(&v))
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let poll_timeout = std::env::var("GENERATION_POLL_TIMEOUT_SECS")
            .map(|v| {
                Duration::from_secs(
                    v.parse()
                        .expect("GENERATION_POLL_TIMEOUT_SECS must be a valid u64"),
                )
            })
            .unwrap_or(DEFAULT_POLL_TIMEOUT);

        let stub_user_id: DbId = std::env::var("STUB_USER_ID")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("STUB_USER_ID must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_root,
            public_files_prefix,
            max_upload_bytes,
            fal: FalConfig::from_env(),
            poll_interval,
            poll_timeout,
            stub_user_id,
        }
    }

    /// Polling settings for the generation runner.
    pub fn runner_settings(&self) -> RunnerSettings {
        RunnerSettings {
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
        }
    }
}

/// Parse `GENERATION_POLL_INTERVAL_MS`. Panics at startup on a value that is
/// not a positive integer.
fn parse_poll_interval_ms(value: &str) -> Duration {
    let millis: u64 = value
        .trim()
        .parse()
        .expect("GENERATION_POLL_INTERVAL_MS must be a valid u64");
    assert!(millis > 0, "GENERATION_POLL_INTERVAL_MS must be greater than 0");
    Duration::from_millis(millis)
}
