//! Shared definitions for the Roster client and server.
//!
//! - [`error`] - the unified [`Error`] type and its gRPC status mapping.
//! - [`types`] - identifier alias, field limits and the wire timestamp format.
//! - [`proto`] - generated protobuf messages and service stubs.

pub mod error;
pub mod types;

pub use error::{Error, Result};

/// gRPC service and message definitions generated from `proto/roster.proto`.
///
/// ## Service
///
/// - `UserManagement` - four unary CRUD calls plus the server-streaming
///   `ListUsers`.
///
/// Every unary reply carries `success` and a human-readable `message`.
/// Business-rule failures (bad input, unknown id, duplicate email) are
/// reported there rather than as a gRPC status.
pub mod proto {
    tonic::include_proto!("roster");

    /// Encoded descriptor set used to register gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("roster_descriptor");
}
