use std::sync::{Arc, Mutex};

use crate::firestore::client::FirestoreClient;
use crate::firestore::collection::{CollectionOnce, LiveCollection};
use crate::firestore::error::FirestoreError;
use crate::firestore::options::PaginateOptions;
use crate::reactive::{DeepCompareEffect, ObserverSet, PartialObserver, SharedSpawner, Unsubscribe};

/// Page cursor and display-set bookkeeping shared by both pagination
/// bindings.
///
/// The wrapped collection requests `limit * page + 1` items; the extra item
/// is a probe whose presence alone decides `has_more`. `accumulated` is
/// replaced wholesale when a non-loading result for the current window
/// arrives and survives untouched while a page transition is in flight, so
/// `load_more` never flashes an empty list.
struct Pager<T> {
    limit: usize,
    state: Mutex<PageState<T>>,
    accumulate: Mutex<DeepCompareEffect<(Option<bool>, Vec<T>)>>,
}

struct PageState<T> {
    page: u32,
    accumulated: Vec<T>,
}

impl<T: Clone + PartialEq> Pager<T> {
    fn new(limit: usize, page: u32) -> Self {
        Self {
            limit,
            state: Mutex::new(PageState {
                page,
                accumulated: Vec::new(),
            }),
            accumulate: Mutex::new(DeepCompareEffect::new()),
        }
    }

    fn page(&self) -> u32 {
        self.state.lock().unwrap().page
    }

    fn bump_page(&self) {
        self.state.lock().unwrap().page += 1;
    }

    /// Items covered by the current window, probe excluded.
    fn window(&self) -> usize {
        self.limit * self.page() as usize
    }

    /// The underlying result set is transiently empty while a later page is
    /// in flight; `loading` must read true during that window.
    fn derived_loading(&self, inner_loading: Option<bool>, inner_len: usize) -> Option<bool> {
        inner_loading.map(|loading| loading || (self.page() > 1 && inner_len == 0))
    }

    /// Folds a fresh inner result into the accumulated display set.
    fn sync(&self, inner_loading: Option<bool>, inner_data: Vec<T>) {
        let derived = self.derived_loading(inner_loading, inner_data.len());
        let mut accumulate = self.accumulate.lock().unwrap();
        accumulate.run((derived, inner_data.clone()), || {
            if derived == Some(true) {
                return None;
            }
            self.state.lock().unwrap().accumulated = inner_data;
            None
        });
    }

    fn has_more(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.accumulated.len() > self.limit * state.page as usize
    }

    /// The accumulated set with the trailing probe item removed while more
    /// data remains.
    fn data(&self) -> Vec<T> {
        let state = self.state.lock().unwrap();
        if state.accumulated.len() > self.limit * state.page as usize {
            state.accumulated[..state.accumulated.len() - 1].to_vec()
        } else {
            state.accumulated.clone()
        }
    }
}

/// Streaming, monotonically growing window over an ordered query.
///
/// Ordering is the caller's responsibility: the base query must already
/// carry whatever ordering criterion makes "the first `n` items" meaningful.
pub struct PaginatedCollection<C: FirestoreClient> {
    inner: LiveCollection<C>,
    client: Arc<C>,
    pager: Arc<Pager<C::Document>>,
    base: Option<C::Query>,
    observers: ObserverSet<()>,
    _changes: Unsubscribe,
}

impl<C: FirestoreClient> PaginatedCollection<C>
where
    C::Document: PartialEq,
{
    pub fn bind(client: Arc<C>, options: PaginateOptions) -> Self {
        let inner = LiveCollection::bind(Arc::clone(&client), options.binding.clone());
        let pager = Arc::new(Pager::new(options.limit, options.default_page.max(1)));
        let observers = ObserverSet::new();

        let changes = {
            let pager = Arc::clone(&pager);
            let inner_state = inner.state_handle();
            let outer = observers.clone();
            inner.subscribe(PartialObserver::new().with_next(move |_| {
                let (loading, data) = {
                    let state = inner_state.lock().unwrap();
                    (state.loading, state.data.clone())
                };
                pager.sync(loading, data);
                outer.notify(&());
            }))
        };

        Self {
            inner,
            client,
            pager,
            base: None,
            observers,
            _changes: changes,
        }
    }

    /// Points the binding at a new base query (or at nothing). The page
    /// cursor survives base-query changes, as a growing feed would expect.
    pub fn set_query(&mut self, base: Option<C::Query>) {
        self.base = base;
        self.apply();
    }

    /// Grows the window by one page. Never shrinks; calling again while a
    /// page is in flight coalesces into further monotonic increments.
    pub fn load_more(&mut self) {
        self.pager.bump_page();
        self.apply();
    }

    fn apply(&mut self) {
        let window = self.pager.window();
        let query = self
            .base
            .as_ref()
            .map(|base| self.client.with_limit(base, window + 1));
        self.inner.set_query(query);
        self.pager.sync(self.inner.loading(), self.inner.data());
        self.observers.notify(&());
    }

    pub fn data(&self) -> Vec<C::Document> {
        self.pager.data()
    }

    pub fn loading(&self) -> Option<bool> {
        self.pager
            .derived_loading(self.inner.loading(), self.inner.data().len())
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub fn error(&self) -> Option<FirestoreError> {
        self.inner.error()
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<C: FirestoreClient> Drop for PaginatedCollection<C> {
    fn drop(&mut self) {
        self.observers.notify_complete();
    }
}

/// One-shot variant of [`PaginatedCollection`]; each window change issues a
/// single read through the wrapped [`CollectionOnce`].
pub struct PaginatedCollectionOnce<C: FirestoreClient> {
    inner: CollectionOnce<C>,
    client: Arc<C>,
    pager: Arc<Pager<C::Document>>,
    base: Option<C::Query>,
    observers: ObserverSet<()>,
    _changes: Unsubscribe,
}

impl<C: FirestoreClient> PaginatedCollectionOnce<C>
where
    C::Document: PartialEq,
{
    pub fn bind(client: Arc<C>, spawner: SharedSpawner, options: PaginateOptions) -> Self {
        let inner = CollectionOnce::bind(Arc::clone(&client), spawner, options.binding.clone());
        let pager = Arc::new(Pager::new(options.limit, options.default_page.max(1)));
        let observers = ObserverSet::new();

        let changes = {
            let pager = Arc::clone(&pager);
            let inner_state = inner.state_handle();
            let outer = observers.clone();
            inner.subscribe(PartialObserver::new().with_next(move |_| {
                let (loading, data) = {
                    let state = inner_state.lock().unwrap();
                    (state.loading, state.data.clone())
                };
                pager.sync(loading, data);
                outer.notify(&());
            }))
        };

        Self {
            inner,
            client,
            pager,
            base: None,
            observers,
            _changes: changes,
        }
    }

    pub fn set_query(&mut self, base: Option<C::Query>) {
        self.base = base;
        self.apply();
    }

    pub fn load_more(&mut self) {
        self.pager.bump_page();
        self.apply();
    }

    fn apply(&mut self) {
        let window = self.pager.window();
        let query = self
            .base
            .as_ref()
            .map(|base| self.client.with_limit(base, window + 1));
        self.inner.set_query(query);
        self.pager.sync(self.inner.loading(), self.inner.data());
        self.observers.notify(&());
    }

    pub fn data(&self) -> Vec<C::Document> {
        self.pager.data()
    }

    pub fn loading(&self) -> Option<bool> {
        self.pager
            .derived_loading(self.inner.loading(), self.inner.data().len())
    }

    pub fn has_more(&self) -> bool {
        self.pager.has_more()
    }

    pub fn error(&self) -> Option<FirestoreError> {
        self.inner.error()
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<C: FirestoreClient> Drop for PaginatedCollectionOnce<C> {
    fn drop(&mut self) {
        self.observers.notify_complete();
    }
}
