//! Admission control and graceful shutdown for [`UserService`].
//!
//! [`Lifecycle`] tracks whether new calls are accepted and how many
//! `ListUsers` streams are in flight. Shutdown runs in phases: refuse new
//! calls, let running streams drain for a bounded time, then cancel whatever
//! is left through a shared [`CancellationToken`].
//!
//! [`UserService`]: super::handler::UserService

use crate::server::telemetry::{
    decrement_streams_inflight, increment_streams_inflight, record_stream_duration,
};
use core::time::Duration;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use roster_tonic_core::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Lifecycle {
    shutting_down: AtomicBool,
    streams_inflight: AtomicUsize,
    shutdown_token: CancellationToken,
    drain_timeout: Duration,
}

impl Lifecycle {
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            shutting_down: AtomicBool::new(false),
            streams_inflight: AtomicUsize::new(0),
            shutdown_token: CancellationToken::new(),
            drain_timeout,
        }
    }

    /// # Errors
    ///
    /// [`Error::ServiceShutdown`] once shutdown has begun.
    pub fn ensure_accepting(&self) -> Result<()> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(Error::ServiceShutdown);
        }
        Ok(())
    }

    /// Token cancelled when the drain window expires. Stream producers
    /// observe it before every emission.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn streams_inflight(&self) -> usize {
        self.streams_inflight.load(Ordering::Acquire)
    }

    /// Registers a new in-flight stream. It counts until the guard drops.
    pub fn stream_started(self: &Arc<Self>) -> StreamGuard {
        self.streams_inflight.fetch_add(1, Ordering::AcqRel);
        increment_streams_inflight();
        StreamGuard {
            lifecycle: Arc::clone(self),
            started: Instant::now(),
        }
    }

    /// Gracefully shuts the service down.
    ///
    /// - Stops admitting new calls.
    /// - Waits up to the drain timeout for in-flight streams to finish.
    /// - Cancels the shared token so any remaining streams stop at their next
    ///   emission.
    pub async fn shutdown(&self) {
        // === Phase 0: Stop accepting new requests ===
        tracing::info!("Refusing new requests");
        self.shutting_down.store(true, Ordering::Release);

        // === Phase 1: Wait for in-flight streams to drain ===
        tracing::info!("Draining in-flight streams ({} active)", self.streams_inflight());
        let drained = timeout(self.drain_timeout, async {
            while self.streams_inflight() > 0 {
                sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight streams drained"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.streams_inflight()
            ),
        }

        // === Phase 2: Cancel any remaining work ===
        self.shutdown_token.cancel();
        tracing::info!("User service shutdown complete");
    }
}

/// Keeps a stream counted as in flight. Dropping it records the stream's
/// duration.
pub struct StreamGuard {
    lifecycle: Arc<Lifecycle>,
    started: Instant,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.lifecycle.streams_inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
        record_stream_duration(self.started.elapsed().as_secs_f64() * 1000.0);
    }
}
