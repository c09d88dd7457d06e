use anyhow::{Context, Result};
use doconvert_core::{AppConfig, OfficeConverter, create_converter};
use std::sync::Arc;

/// Global application state
///
/// Requests share nothing mutable; this is read-only after startup.
pub struct AppState {
    pub config: AppConfig,
    /// Backend used by the office conversion endpoints
    pub converter: Arc<dyn OfficeConverter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let converter = create_converter(&config.converter)
            .context("Failed to create office converter")?;
        Ok(Self::with_converter(config, converter))
    }

    pub fn with_converter(config: AppConfig, converter: Arc<dyn OfficeConverter>) -> Self {
        Self { config, converter }
    }

    /// Request body limit: every file at its maximum size.
    pub const fn body_limit(&self) -> usize {
        self.config
            .server
            .max_file_size
            .saturating_mul(self.config.server.max_files)
    }
}
