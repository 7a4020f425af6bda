//! gRPC service implementation and request lifecycle.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`UserService`).
//! - [`lifecycle`] - admission control and graceful shutdown.
//! - [`projection`] - conversion of stored records into wire messages.

pub mod handler;
pub mod lifecycle;
pub mod projection;
