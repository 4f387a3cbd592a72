use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Connection, DNS, TLS or body decoding failure
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP error {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// A built-in CSS selector failed to parse
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// A pagination link is present but has no target
    #[error("next-page link on {page} has no href")]
    MissingHref { page: String },

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The config file could not be parsed
    #[error("failed to parse config file {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
