//! Progress reporting for pipeline runs.
//!
//! The pipeline reports geocoding progress through [`ProgressCallback`] so
//! it stays independent of how (or whether) progress is drawn. The CLI
//! plugs in `indicatif` bars; tests and the server use [`NullProgress`].

use std::sync::Arc;

/// Receiver for progress updates of a long-running step.
///
/// Must be `Send + Sync` so it can be shared through an [`Arc`] with
/// spawned tasks.
pub trait ProgressCallback: Send + Sync {
    /// Total units of work, once known.
    fn set_total(&self, total: u64);

    /// Absolute position.
    fn set_position(&self, pos: u64);

    /// Advance by `delta` units.
    fn inc(&self, delta: u64);

    /// Text shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Complete, leaving a final message.
    fn finish(&self, msg: String);

    /// Complete and remove the indicator.
    fn finish_and_clear(&self);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
