use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::common::AppConfig;
use crate::registry::SessionRegistry;
use crate::storage::UploadStore;

/// Shared state for the HTTP handlers.
///
/// The registry is built here, once, and reaches both the offer side (upload
/// handler) and the serve side (spawned transfer tasks) by reference.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub store: UploadStore,
    pub config: Arc<AppConfig>,
    /// Root token; every spawned serve task waits on a child of it, so
    /// shutdown releases ports still waiting for a downloader.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: UploadStore) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.code_range.as_range()));
        Self {
            registry,
            store,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }
}
