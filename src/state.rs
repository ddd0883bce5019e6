use std::sync::Arc;

use crate::api::{ApiClient, Session};
use crate::catalog::Catalog;
use crate::config::AppConfig;

/// Process-wide state shared by the HTTP handlers and CLI commands.
pub struct AppState {
    /// Loaded once at startup, never mutated.
    pub catalog: Arc<Catalog>,
    pub config: AppConfig,
    /// Anonymous backend client for public proxies (profiles, comment threads).
    pub api: ApiClient,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, config: AppConfig) -> Result<Self, String> {
        let api = ApiClient::new(&config.api_url, Arc::new(Session::new()), config.request_timeout())?;
        Ok(Self { catalog, config, api })
    }
}
