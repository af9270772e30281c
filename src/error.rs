//! Error types for kag-translate.
//!
//! Uses `thiserror` for structured error definitions. Generation errors are
//! never fatal: the retry wrapper treats them the same as an empty response.

use thiserror::Error;

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for a single generation request.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// HTTP request to API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Error type for loading the name dictionary and speaker database.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Failed to read a lookup file
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON
    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A name dictionary value is not a string
    #[error("Invalid entry '{key}' in {path}: value must be a string")]
    InvalidEntry { path: String, key: String },
}

/// Error type for reading and writing script files.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Failed to read the input script
    #[error("Failed to read script {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the output script
    #[error("Failed to write script {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Output contains a character the script encoding cannot represent
    #[error("Cannot write {path}: '{character}' is not representable in {encoding}")]
    Unencodable {
        path: String,
        encoding: &'static str,
        character: char,
    },

    /// Encoding label not recognized
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
}
