//! Host-initiated cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{PolarisError, Result};

/// Cancellation flag shared between the host and a running build step.
///
/// Blocking sub-steps check it and turn a set flag into
/// [`PolarisError::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if interruption was requested.
    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with `Interrupted` if interruption was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_interrupted() {
            Err(PolarisError::Interrupted)
        } else {
            Ok(())
        }
    }
}
