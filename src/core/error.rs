//! Error types for the saferoute library
//!
//! Fetch failures never propagate out of an orchestration: the routing core
//! drops a failed fetch on the floor and the corresponding overlay simply
//! never appears. These types exist for the internal plumbing (and for the
//! log line emitted at each drop point), not for the caller.

use std::fmt;

/// Main error type for saferoute operations
#[derive(Debug)]
pub enum Error {
    /// Network connectivity issues (connect failures, dropped transports)
    NetworkError(String),

    /// HTTP-specific error (non-2xx status, request-level failure)
    HttpError(String),

    /// Response body was not the JSON shape we expected
    MalformedResponse(String),

    /// A fetch succeeded but produced nothing renderable (empty shape)
    EmptyResult,

    /// Invalid configuration or parameters
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::MalformedResponse(msg) => {
                write!(f, "Malformed response: {}", msg)
            }
            Error::EmptyResult => {
                write!(f, "Empty result")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

/// Convenience result type for saferoute operations
pub type Result<T> = std::result::Result<T, Error>;
