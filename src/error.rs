//! Error types for Bandcamp scraping and downloading.

use std::path::PathBuf;

use thiserror::Error;

/// A network request that did not produce a usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with something other than `200 OK`.
    #[error("request to {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or body transfer failure.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL that was requested.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Network { url, .. } => url,
        }
    }

    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A page that did not have the expected structure.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The catalog page has no release grid.
    #[error("missing release grid")]
    MissingGrid,

    /// The release page carries no `data-tralbum` script attribute.
    #[error("no embedded release data")]
    NoEmbeddedData,

    /// The embedded payload lacks a required field or has the wrong type.
    #[error("malformed payload: missing or invalid `{field}`")]
    MalformedPayload { field: &'static str },

    /// The embedded payload is not JSON.
    #[error("embedded payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main error type for all operations.
#[derive(Debug, Error)]
pub enum TralbumError {
    /// HTTP request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fetched page could not be parsed.
    #[error("failed to parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl TralbumError {
    pub(crate) fn parse(url: impl Into<String>, source: ParseError) -> Self {
        TralbumError::Parse {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TralbumError::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying fetch error, if this is one.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            TralbumError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for tralbum operations.
pub type Result<T> = std::result::Result<T, TralbumError>;
