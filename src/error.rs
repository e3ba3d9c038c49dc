use thiserror::Error;

/// Errors raised at the edges of the engine: loading inputs and validating
/// caller arguments. The analytic functions themselves never fail.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
