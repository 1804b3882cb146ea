//! Error types for the fleet API client.
//!
//! # Design
//! Variants follow the operation that failed rather than the HTTP status:
//! a rejected login, an exhausted update, and an exhausted report creation
//! each get their own variant so callers can tell which path broke. `404`
//! keeps a dedicated `NotFound` because callers routinely branch on it.

use thiserror::Error;

/// Errors returned by `FleetClient` parse methods and `FleetApi` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `POST /auth/login` answered with a non-2xx status.
    #[error("authentication failed: HTTP {status}: {body}")]
    Authentication { status: u16, body: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// A list/get/create/delete/lookup call returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Both the `application/json` and `merge-patch` attempts were refused,
    /// or the first attempt failed with a status that does not trigger the
    /// merge-patch retry.
    #[error("update failed: HTTP {status}: {body}")]
    UpdateFailed { status: u16, body: String },

    /// The dedicated report endpoint and the repository fallback both failed.
    #[error("report creation failed (primary: {primary_status} {primary_body}; fallback: {fallback})")]
    ReportCreationFailed {
        primary_status: u16,
        primary_body: String,
        fallback: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport could not complete the round-trip.
    #[error("transport error: {0}")]
    Transport(String),
}
