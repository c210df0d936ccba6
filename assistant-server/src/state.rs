//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::chat::ChatProvider;
use crate::config::Config;
use crate::entities::AnyStore;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Project / assistant persistence.
    pub store: Arc<AnyStore>,
    /// Text-generation backend used by `POST /api/chat`.
    pub provider: Arc<dyn ChatProvider>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
