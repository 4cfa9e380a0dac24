//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lecture_catalog_core::{CatalogService, CatalogStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub catalog: CatalogService,
    pub config: Arc<Config>,
    /// Fired on shutdown; uploads still being encoded are abandoned.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: Arc<dyn CatalogStore>, config: Arc<Config>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            store,
            config,
            shutdown: CancellationToken::new(),
        }
    }
}
