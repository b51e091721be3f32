//! Error types for the csob-rs library.
//!
//! This module defines all error types that can occur while loading keys,
//! signing requests, talking to the gateway and decoding its responses.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum CsobError {
    /// The private or public key file is missing, unreadable or malformed
    #[error("Key load error: {0}")]
    KeyLoadError(String),

    /// The RSA signing operation failed
    #[error("Signing error: {0}")]
    SigningError(String),

    /// The RSA-OAEP decryption failed (bad padding or key mismatch)
    #[error("Decryption error: {0}")]
    DecryptionError(String),

    /// Network failure reported by the HTTP transport
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The gateway answered with a status code other than 200
    #[error("Gateway returned HTTP {status_code}: {body}")]
    GatewayError {
        /// HTTP status code of the response
        status_code: u16,
        /// Raw response body, as returned by the gateway
        body: String,
    },

    /// The response body was not the expected JSON
    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),

    /// Request data rejected before it was signed or sent
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A response or callback signature did not verify against the gateway key
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    /// Error during Base64 decoding
    #[error("Base64 error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Error parsing URL
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, CsobError>;

impl From<reqwest::Error> for CsobError {
    fn from(err: reqwest::Error) -> Self {
        CsobError::TransportError(err.to_string())
    }
}
