//! Error types for trendlens-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while preparing an analysis pass.
///
/// The analysis functions themselves never fail; these cover the inputs
/// handed to them.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A window length other than 7, 30 or 90 days was requested.
    #[error("unsupported window length: {0} days. Use: 7, 30, 90")]
    UnsupportedWindow(u32),

    /// An unknown taxonomy name was provided.
    #[error("unknown taxonomy: {name}. Use: {available}")]
    UnknownTaxonomy {
        /// The taxonomy name that was requested.
        name: String,
        /// Comma-separated list of available taxonomy names.
        available: String,
    },

    /// The card payload could not be decoded.
    #[error("malformed card payload: {0}")]
    MalformedCards(#[from] serde_json::Error),
}

/// Result type alias using [`AnalysisError`].
pub type AnalysisResult<T> = Result<T, AnalysisError>;
