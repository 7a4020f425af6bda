//! Server-side components of the Roster user record service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI / environment configuration.
//! - [`store`] - the shared in-memory user store.
//! - [`validation`] - stateless request validation.
//! - [`service`] - the `UserManagement` gRPC service and its lifecycle.
//! - [`streaming`] - snapshot selection and emission for `ListUsers`.
//! - [`telemetry`] - structured logging and optional OpenTelemetry export.
//!
//! These components are wired together in the server's `main.rs`.

pub mod config;
pub mod service;
pub mod store;
pub mod streaming;
pub mod telemetry;
pub mod validation;
