// src/state.rs

use std::sync::Arc;

use crate::{
    config::Config,
    services::{AttemptService, CatalogService, ResultService, SubmissionService},
    store::Store,
    utils::time::Clock,
};

/// Shared application state. Cheap to clone: everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub attempts: AttemptService,
    pub submissions: SubmissionService,
    pub results: ResultService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: AttemptService::new(store.clone(), clock.clone()),
            submissions: SubmissionService::new(store.clone(), clock),
            results: ResultService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            config,
            store,
        }
    }
}
