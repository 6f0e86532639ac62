//! Progress reporting and cooperative cancellation.

/// Receives progress updates from a running computation.
///
/// `fraction` grows monotonically from 0 to 1. Returning `false` asks the
/// computation to stop; it then fails with
/// [`EngineError::Cancelled`](crate::EngineError::Cancelled).
pub trait ProgressSink {
    /// Report progress; return `false` to cancel.
    fn report(&mut self, fraction: f64, message: &str) -> bool;
}

impl<F> ProgressSink for F
where
    F: FnMut(f64, &str) -> bool,
{
    fn report(&mut self, fraction: f64, message: &str) -> bool {
        self(fraction, message)
    }
}

/// A sink that ignores updates and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _fraction: f64, _message: &str) -> bool {
        true
    }
}
