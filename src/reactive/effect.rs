use std::sync::Arc;

/// Teardown closure returned by an effect body; runs before the effect
/// re-runs and when the cell is dropped.
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// The generic re-run primitive underneath every binding.
///
/// A `DepsEffect` re-executes its effect body whenever the *identity* of the
/// dependency cell changes (`Arc::ptr_eq`), running the previous run's
/// cleanup first. It deliberately does not look at the dependency value:
/// value-level comparison belongs to [`CustomCompareEffect`], which decides
/// when to hand this cell a new `Arc` and when to hand it the memoized one.
///
/// [`CustomCompareEffect`]: super::compare::CustomCompareEffect
pub struct DepsEffect<D> {
    current: Option<Arc<D>>,
    cleanup: Option<Cleanup>,
}

impl<D> DepsEffect<D> {
    pub fn new() -> Self {
        Self {
            current: None,
            cleanup: None,
        }
    }

    /// Runs the effect if `deps` is a different cell than the last run's.
    ///
    /// The first call always runs the effect.
    pub fn run<F>(&mut self, deps: Arc<D>, effect: F)
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        if let Some(current) = &self.current {
            if Arc::ptr_eq(current, &deps) {
                return;
            }
        }
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        self.current = Some(deps);
        self.cleanup = effect();
    }

    /// Runs the pending cleanup and forgets the current dependency cell.
    pub fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        self.current = None;
    }
}

impl<D> Default for DepsEffect<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Drop for DepsEffect<D> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}
