//! Error types for Tapedeck

use std::io;
use thiserror::Error;

use crate::cassette::NetworkFailure;

/// Result type for Tapedeck operations
pub type Result<T> = std::result::Result<T, TapedeckError>;

/// Errors that can occur in Tapedeck
#[derive(Debug, Error)]
pub enum TapedeckError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Live request has no matching unconsumed interaction or stub
    #[error("no recorded interaction matches {method} {url}")]
    RequestNotMatch {
        /// HTTP method of the offending request
        method: String,
        /// Url of the offending request
        url: String,
    },

    /// Replaying cassette has no unconsumed interactions left
    #[error("cassette exhausted: no interactions left to match {method} {url}")]
    CassetteExhausted {
        /// HTTP method of the offending request
        method: String,
        /// Url of the offending request
        url: String,
    },

    /// A recorder scope was entered while another is active on this thread
    #[error("a cassette scope is already active on this thread")]
    ScopeReentry,

    /// A scope operation was attempted with no active scope
    #[error("no cassette scope is active on this thread")]
    ScopeNotActive,

    /// Live or replayed network failure, surfaced with recorded semantics
    #[error("network failure: {0}")]
    Network(NetworkFailure),

    /// Invalid cassette file content
    #[error("invalid cassette format: {0}")]
    InvalidFormat(String),

    /// Invalid cassette name
    #[error("invalid cassette name: {0}")]
    InvalidCassetteName(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
