//! Error types for the API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and the API's error messages for debugging.
//!
//! Local invariant violations are split from remote failures:
//! `Configuration` covers a client that cannot make calls at all, `Logic`
//! covers a call that makes no sense for the receiver. Everything the
//! transport or the server produces is passed through unchanged.

use thiserror::Error;

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client configuration is invalid, or a resource has no live client
    /// to issue follow-up calls through.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The operation is not meaningful for the receiver, e.g. expanding a
    /// resource that has no ID.
    #[error("logic error: {0}")]
    Logic(String),

    /// The server returned 404 — the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connection refused, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// True for failures that originate in the transport or on the server,
    /// as opposed to local misuse of the client.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound
                | ApiError::HttpError { .. }
                | ApiError::Transport(_)
                | ApiError::DeserializationError(_)
        )
    }
}
