//! Progress callbacks.
//!
//! Hosts that want feedback from a long operation hand it a [`Progress`]; the
//! operation calls it with `(current, total, message)`. Pass
//! [`Progress::none`] to ignore updates.
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use mcflow::algo::Progress;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let seen = calls.clone();
//! let progress = Progress::new(move |_, _, _| {
//!     seen.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! progress.report(1, 4, "estimating curvature");
//! assert_eq!(calls.load(Ordering::Relaxed), 1);
//! ```

type Callback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// A progress sink receiving `(current, total, message)` updates.
pub struct Progress {
    callback: Callback,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A sink that discards every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }

    /// Report that `current` of `total` steps are done.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress of a sub-task that occupies step `step` of `steps`.
    ///
    /// The sub-task's own `done / of` fraction is folded into the outer step,
    /// in thousandths, so the reported `current / total` keeps increasing
    /// across sub-tasks.
    #[inline]
    pub fn report_sub(&self, done: usize, of: usize, step: usize, steps: usize, message: &str) {
        if of == 0 || steps == 0 {
            return;
        }
        let fraction = (done.min(of) * 1000) / of;
        (self.callback)(step * 1000 + fraction, steps * 1000, message);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
