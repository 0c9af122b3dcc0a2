use std::sync::Arc;

use signage_fal::FalApi;
use signage_pipeline::{FileStorage, GenerationRunner};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// The generation runner as wired in production.
pub type Runner = GenerationRunner<FalApi>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: signage_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (admin clients and players).
    pub ws_manager: Arc<WsManager>,
    /// Event bus for publishing domain events.
    pub event_bus: Arc<signage_events::EventBus>,
    /// Generation pipeline.
    pub runner: Arc<Runner>,
}

impl AppState {
    /// Local file storage (shared with the runner).
    pub fn storage(&self) -> &FileStorage {
        self.runner.storage()
    }
}
