use std::sync::Arc;

use crate::ai_client::AiClient;
use crate::config::Config;
use crate::layout::FitConfig;
use crate::storage::StoragePort;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Backs the draft slots and the application log. Redis, or process memory.
    pub storage: Arc<dyn StoragePort>,
    pub ai: AiClient,
    pub fit: FitConfig,
    pub config: Config,
}
