//! Error types for the user record service.
//!
//! This module defines the central `Error` enum covering every failure the
//! service can report. It implements `From<Error>` for `tonic::Status` so the
//! errors that are not turned into `success = false` replies can propagate to
//! clients with an appropriate status code.
//!
//! ## Error Cases
//! - `Validation`: A request field is missing or malformed.
//! - `NotFound`: The requested user id does not exist.
//! - `Conflict`: The email is already used by another existing user.
//! - `Internal`: An unexpected fault. The context is for logs only and never
//!   reaches the client.
//! - `ServiceShutdown`: A request arrived while the service was shutting down.

use crate::types::UserId;
use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Message returned to clients for any internal fault.
pub const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Unified error type for the user record service.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A request field failed validation. The reason is client-facing.
    #[error("{reason}")]
    Validation { reason: String },

    /// No user with this id exists.
    #[error("User not found")]
    NotFound { id: UserId },

    /// Another existing user already owns this email.
    #[error("A user with this email already exists")]
    Conflict { email: String },

    /// Unexpected server-side fault.
    #[error("Internal error: {context}")]
    Internal { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl Error {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal {
            context: context.into(),
        }
    }

    /// Returns `true` for rule violations that are answered with a
    /// `success = false` reply instead of a transport-level status.
    pub const fn is_business(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::Conflict { .. }
        )
    }

    /// Short label used for logs and metric attributes.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Internal { .. } => "internal",
            Self::ServiceShutdown => "shutdown",
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { reason } => Status::invalid_argument(reason),
            e @ Error::NotFound { .. } => Status::not_found(e.to_string()),
            e @ Error::Conflict { .. } => Status::already_exists(e.to_string()),
            Error::Internal { .. } => Status::internal(INTERNAL_MESSAGE),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
