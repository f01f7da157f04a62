//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." Responses carrying the API's structured error envelope land in
//! `Api` so pages can surface the server's own message; anything else
//! non-2xx lands in `HttpError` with the raw status code and body.

use thiserror::Error;

/// Errors returned by the client, the session store, and the query cache.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the request with a structured error body.
    #[error("HTTP {status} {name}: {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
    },

    /// The server returned a non-2xx status without a recognizable error body.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// No logged-in user is available for an authenticated request.
    #[error("no session: log in first")]
    MissingSession,

    /// The session storage could not be read or written.
    #[error("session storage: {0}")]
    Storage(String),

    /// The transport failed before any response was received.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// The message a user should see, when the server supplied one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}
