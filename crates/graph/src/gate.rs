//! Newest-request-wins gate for asynchronous graph builds
//!
//! Every build takes a ticket; starting a newer build makes all earlier
//! tickets stale. A build holding a stale ticket must drop its result.

use citenet_common::errors::{AppError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hands out monotonically increasing build tickets
#[derive(Debug, Clone, Default)]
pub struct BuildGate {
    latest: Arc<AtomicU64>,
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a build, superseding every earlier ticket
    pub fn begin(&self) -> BuildTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        BuildTicket {
            generation,
            latest: self.latest.clone(),
        }
    }

    /// Generation of the newest ticket handed out (0 before the first)
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Claim on the right to publish a build result
#[derive(Debug, Clone)]
pub struct BuildTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl BuildTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer ticket has been handed out
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// `StaleResponse` once superseded
    pub fn ensure_current(&self) -> Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(AppError::StaleResponse)
        }
    }
}
