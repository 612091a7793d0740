use crate::firestore::error::FirestoreError;
use crate::reactive::ObserverSet;

/// Render-scoped fetch state shared by the document and collection bindings.
///
/// `loading` is `None` exactly while no key is set, `Some(true)` while the
/// first result for the current key is outstanding, `Some(false)` once that
/// key has delivered a result or a failure.
pub(crate) struct FetchState<V> {
    pub data: V,
    pub loading: Option<bool>,
    pub error: Option<FirestoreError>,
}

impl<V: Default> FetchState<V> {
    pub fn idle() -> Self {
        Self {
            data: V::default(),
            loading: None,
            error: None,
        }
    }

    /// Key cleared: back to the never-fetched shape.
    pub fn reset_idle(&mut self) {
        self.data = V::default();
        self.loading = None;
        self.error = None;
    }

    /// New key set: the previous key's data and error do not survive into
    /// the new cycle.
    pub fn begin_loading(&mut self) {
        self.data = V::default();
        self.loading = Some(true);
        self.error = None;
    }
}

/// Routes a failure the caller asked not to capture.
///
/// The registered error callbacks are the framework-boundary seam; a failure
/// nobody listens for is still surfaced in the log rather than dropped.
pub(crate) fn propagate_error(observers: &ObserverSet<()>, error: &FirestoreError) {
    if !observers.notify_error(error) {
        log::error!("unobserved firestore binding failure: {error}");
    }
}
