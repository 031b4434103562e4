use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::PipelineError;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Listing prefix for simple equity backtests
    pub simple_prefix: String,
    /// Listing prefix for leverage backtests
    pub leverage_prefix: String,
    pub initial_capital: f64,
    pub spreadsheet_extension: String,
    pub quote_cache_ttl_secs: u64,
    pub quote_cache_capacity: usize,
    pub quote_base_url: String,
    pub quote_requests_per_second: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            simple_prefix: "backtests/".to_string(),
            leverage_prefix: "leverage-backtests/".to_string(),
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            spreadsheet_extension: ".xlsx".to_string(),
            quote_cache_ttl_secs: 5,
            quote_cache_capacity: 256,
            quote_base_url: "https://api.binance.com/api/v3/ticker/price".to_string(),
            quote_requests_per_second: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub simple_prefix: Option<String>,
    pub leverage_prefix: Option<String>,
    pub initial_capital: Option<f64>,
    pub spreadsheet_extension: Option<String>,
    pub quote_cache_ttl_secs: Option<u64>,
    pub quote_cache_capacity: Option<usize>,
    pub quote_base_url: Option<String>,
    pub quote_requests_per_second: Option<u32>,
}

impl PipelineSettings {
    /// Load settings from a JSON file; missing fields fall back to defaults
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let data = std::fs::read(path).map_err(|e| {
            PipelineError::SettingsError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings: PipelineSettings = serde_json::from_slice(&data).map_err(|e| {
            PipelineError::SettingsError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply a partial update and re-validate
    pub fn apply(mut self, input: UpdateSettingsInput) -> Result<Self, PipelineError> {
        if let Some(v) = input.simple_prefix {
            self.simple_prefix = v;
        }
        if let Some(v) = input.leverage_prefix {
            self.leverage_prefix = v;
        }
        if let Some(v) = input.initial_capital {
            self.initial_capital = v;
        }
        if let Some(v) = input.spreadsheet_extension {
            self.spreadsheet_extension = v;
        }
        if let Some(v) = input.quote_cache_ttl_secs {
            self.quote_cache_ttl_secs = v;
        }
        if let Some(v) = input.quote_cache_capacity {
            self.quote_cache_capacity = v;
        }
        if let Some(v) = input.quote_base_url {
            self.quote_base_url = v;
        }
        if let Some(v) = input.quote_requests_per_second {
            self.quote_requests_per_second = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(PipelineError::SettingsError(format!(
                "initial_capital must be a positive number, got {}",
                self.initial_capital
            )));
        }
        if self.quote_cache_capacity == 0 {
            return Err(PipelineError::SettingsError(
                "quote_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.quote_requests_per_second == 0 {
            return Err(PipelineError::SettingsError(
                "quote_requests_per_second must be at least 1".to_string(),
            ));
        }
        if !self.spreadsheet_extension.starts_with('.') {
            return Err(PipelineError::SettingsError(format!(
                "spreadsheet_extension must start with '.', got '{}'",
                self.spreadsheet_extension
            )));
        }
        Ok(())
    }
}
