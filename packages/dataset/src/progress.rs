//! Progress reporting for generation runs.
//!
//! [`ProgressCallback`] keeps the generator independent of any rendering
//! backend. The CLI plugs in `indicatif` bars; tests and library callers
//! use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a generation run.
///
/// Calls may arrive from rayon worker threads, so implementations must be
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Number of cases the run will simulate.
    fn set_total(&self, total: u64);

    /// Called once per finished case.
    fn inc(&self, delta: u64);

    /// Names the current phase (encoding, writing).
    fn set_message(&self, msg: String);

    /// The run completed; `msg` summarizes it.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
