use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Object listing failed for prefix '{prefix}': {message}")]
    ListingError { prefix: String, message: String },

    #[error("Fetch failed for '{key}': {message}")]
    FetchError { key: String, message: String },

    #[error("Unreadable workbook '{key}': {message}")]
    WorkbookError { key: String, message: String },

    #[error("Invalid settings: {0}")]
    SettingsError(String),

    #[error("Quote lookup failed for {symbol}: {message}")]
    QuoteError { symbol: String, message: String },

    #[error("Invalid response: {0}")]
    ParseError(String),

    #[error("Export failed: {0}")]
    ExportError(String),
}

impl PipelineError {
    /// Key or symbol the error is attributed to, when there is one
    pub fn subject(&self) -> Option<&str> {
        match self {
            PipelineError::ListingError { prefix, .. } => Some(prefix),
            PipelineError::FetchError { key, .. } | PipelineError::WorkbookError { key, .. } => {
                Some(key)
            }
            PipelineError::QuoteError { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::ParseError(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::ExportError(err.to_string())
    }
}
