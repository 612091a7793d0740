use std::sync::Arc;

use super::effect::{Cleanup, DepsEffect};

/// Re-runs an effect only when a caller-supplied predicate reports that the
/// dependency value changed.
///
/// The underlying [`DepsEffect`] compares dependency cells by identity, which
/// is too strict for opaque handles whose equality is backend-defined. The
/// cell therefore memoizes the last dependency value the predicate accepted
/// and substitutes it for the latest one: an unchanged value reuses the
/// memoized `Arc` (so the identity check sees the same cell and skips the
/// effect), a changed value allocates a fresh cell.
pub struct CustomCompareEffect<D> {
    memoized: Option<Arc<D>>,
    inner: DepsEffect<D>,
}

impl<D> CustomCompareEffect<D> {
    pub fn new() -> Self {
        Self {
            memoized: None,
            inner: DepsEffect::new(),
        }
    }

    /// Runs `effect` when `is_equal(previous, deps)` is false or on the first
    /// invocation; otherwise leaves the previous run (and its cleanup) alive.
    pub fn run<F, E>(&mut self, deps: D, is_equal: E, effect: F)
    where
        E: FnOnce(&D, &D) -> bool,
        F: FnOnce() -> Option<Cleanup>,
    {
        let accepted = match self.memoized.take() {
            Some(previous) => {
                if is_equal(&previous, &deps) {
                    previous
                } else {
                    Arc::new(deps)
                }
            }
            None => Arc::new(deps),
        };
        self.memoized = Some(Arc::clone(&accepted));
        self.inner.run(accepted, effect);
    }

    /// Runs the pending cleanup and forgets the memoized dependency value.
    pub fn teardown(&mut self) {
        self.memoized = None;
        self.inner.teardown();
    }
}

impl<D> Default for CustomCompareEffect<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`CustomCompareEffect`] with the predicate fixed to structural equality.
///
/// Used where dependencies are plain data rather than opaque handles.
pub struct DeepCompareEffect<D> {
    inner: CustomCompareEffect<D>,
}

impl<D: PartialEq> DeepCompareEffect<D> {
    pub fn new() -> Self {
        Self {
            inner: CustomCompareEffect::new(),
        }
    }

    pub fn run<F>(&mut self, deps: D, effect: F)
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        self.inner.run(deps, |previous, next| previous == next, effect);
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}

impl<D: PartialEq> Default for DeepCompareEffect<D> {
    fn default() -> Self {
        Self::new()
    }
}
