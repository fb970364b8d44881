//! Application state.

use std::sync::Arc;

use clipo_queue::Scheduler;
use clipo_store::RecordStore;

use crate::config::ApiConfig;

/// Shared application state.
///
/// The scheduler is built by the binary and injected here; handlers never
/// construct one.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub scheduler: Arc<Scheduler>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: ApiConfig, scheduler: Arc<Scheduler>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            scheduler,
            store,
        }
    }
}
