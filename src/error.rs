//! Error types for the seat browser.

use thiserror::Error;

/// Failures while fetching the full record set.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode records from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin} did not return a list of records")]
    NotASequence { origin: String },
}

/// Failures of user actions on a running session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("please select a category before sorting by rank")]
    CategoryRequired,

    #[error("export failed: {message}")]
    Export { message: String },
}

impl From<std::io::Error> for BrowserError {
    fn from(e: std::io::Error) -> Self {
        BrowserError::Export { message: e.to_string() }
    }
}

impl From<lopdf::Error> for BrowserError {
    fn from(e: lopdf::Error) -> Self {
        BrowserError::Export { message: e.to_string() }
    }
}

impl From<csv::Error> for BrowserError {
    fn from(e: csv::Error) -> Self {
        BrowserError::Export { message: e.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
