use std::sync::Arc;

use crate::config::Config;
use crate::dictionaries::Dictionaries;
use crate::extraction::ExtractorRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup; read concurrently without locking.
    pub dictionaries: Arc<Dictionaries>,
    /// Document converters for the upload endpoint.
    pub extractors: Arc<ExtractorRegistry>,
    pub config: Config,
}

impl AppState {
    pub fn new(dictionaries: Dictionaries, config: Config) -> Self {
        AppState {
            dictionaries: Arc::new(dictionaries),
            extractors: Arc::new(ExtractorRegistry::default()),
            config,
        }
    }
}
