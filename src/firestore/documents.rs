use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::firestore::client::{FirestoreClient, ListenObserver};
use crate::firestore::effects::RefsEffect;
use crate::firestore::error::FirestoreError;
use crate::firestore::options::BindingOptions;
use crate::firestore::state::propagate_error;
use crate::reactive::{Cleanup, ObserverSet, PartialObserver, SharedSpawner, Unsubscribe};

/// Fan-out state for an ordered reference list.
///
/// `data` keeps the same length and order as the input list and each slot is
/// written in place as its own subscription resolves; `errors` grows in
/// arrival order. `loading` settles only once every position has reported a
/// snapshot or a failure at least once.
struct MultiState<T> {
    data: Vec<Option<T>>,
    errors: Vec<FirestoreError>,
    loading: Option<bool>,
    settled: Vec<bool>,
}

impl<T> MultiState<T> {
    fn idle() -> Self {
        Self {
            data: Vec::new(),
            errors: Vec::new(),
            loading: None,
            settled: Vec::new(),
        }
    }

    fn reset_idle(&mut self) {
        self.data = Vec::new();
        self.errors = Vec::new();
        self.loading = None;
        self.settled = Vec::new();
    }

    fn begin_loading(&mut self, len: usize) {
        self.data = std::iter::repeat_with(|| None).take(len).collect();
        self.errors = Vec::new();
        self.loading = Some(true);
        self.settled = vec![false; len];
    }

    fn settle(&mut self, index: usize) {
        self.settled[index] = true;
        if self.settled.iter().all(|settled| *settled) {
            self.loading = Some(false);
        }
    }
}

/// Streaming view of an ordered list of documents.
pub struct LiveDocuments<C: FirestoreClient> {
    client: Arc<C>,
    options: BindingOptions,
    state: Arc<Mutex<MultiState<C::Document>>>,
    effect: RefsEffect<C>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> LiveDocuments<C> {
    pub fn bind(client: Arc<C>, options: BindingOptions) -> Self {
        Self {
            effect: RefsEffect::new(Arc::clone(&client)),
            client,
            options,
            state: Arc::new(Mutex::new(MultiState::idle())),
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at an ordered reference list.
    ///
    /// Reordering an otherwise-identical list is a change: position decides
    /// which slot of `data` each reference feeds.
    pub fn set_sources(&mut self, references: Option<Vec<C::DocumentRef>>) {
        let references = references.unwrap_or_default();
        let deps: Vec<Option<C::DocumentRef>> =
            references.iter().cloned().map(Some).collect();

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(deps, move || {
            if references.is_empty() {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                return None;
            }

            state.lock().unwrap().begin_loading(references.len());
            observers.notify(&());

            let relevant = Arc::new(AtomicBool::new(true));
            let mut unsubscribes = Vec::with_capacity(references.len());
            for (index, reference) in references.iter().enumerate() {
                let next_state = Arc::clone(&state);
                let next_observers = observers.clone();
                let next_relevant = Arc::clone(&relevant);
                let fail_state = Arc::clone(&state);
                let fail_observers = observers.clone();
                let fail_relevant = Arc::clone(&relevant);
                let throw_error = options.throw_error;

                unsubscribes.push(client.listen_document(
                    reference,
                    &options.snapshot,
                    ListenObserver::new(
                        move |snapshot: Option<C::Document>| {
                            if !next_relevant.load(Ordering::SeqCst) {
                                return;
                            }
                            {
                                let mut state = next_state.lock().unwrap();
                                state.data[index] = snapshot;
                                state.settle(index);
                            }
                            next_observers.notify(&());
                        },
                        move |error: FirestoreError| {
                            if !fail_relevant.load(Ordering::SeqCst) {
                                return;
                            }
                            {
                                let mut state = fail_state.lock().unwrap();
                                state.settle(index);
                                if !throw_error {
                                    state.errors.push(error.clone());
                                }
                            }
                            if throw_error {
                                propagate_error(&fail_observers, &error);
                            }
                            fail_observers.notify(&());
                        },
                    ),
                ));
            }

            log::debug!("opened {} document listens", references.len());
            Some(Box::new(move || {
                relevant.store(false, Ordering::SeqCst);
                for unsubscribe in unsubscribes {
                    unsubscribe();
                }
            }) as Cleanup)
        });
    }

    /// Position-indexed snapshot data, same length and order as the input
    /// list; `None` slots have not resolved or do not exist.
    pub fn data(&self) -> Vec<Option<C::Document>> {
        self.state.lock().unwrap().data.clone()
    }

    /// Accumulated failures in arrival order (non-throwing policy only).
    pub fn errors(&self) -> Vec<FirestoreError> {
        self.state.lock().unwrap().errors.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<C: FirestoreClient> Drop for LiveDocuments<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}

/// One-shot view of an ordered list of documents.
pub struct DocumentsOnce<C: FirestoreClient> {
    client: Arc<C>,
    spawner: SharedSpawner,
    options: BindingOptions,
    state: Arc<Mutex<MultiState<C::Document>>>,
    effect: RefsEffect<C>,
    epoch: Arc<AtomicU64>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> DocumentsOnce<C> {
    pub fn bind(client: Arc<C>, spawner: SharedSpawner, options: BindingOptions) -> Self {
        Self {
            effect: RefsEffect::new(Arc::clone(&client)),
            client,
            spawner,
            options,
            state: Arc::new(Mutex::new(MultiState::idle())),
            epoch: Arc::new(AtomicU64::new(0)),
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at an ordered reference list; each position issues
    /// one read and resolves independently of its siblings' timing.
    pub fn set_sources(&mut self, references: Option<Vec<C::DocumentRef>>) {
        let references = references.unwrap_or_default();
        let deps: Vec<Option<C::DocumentRef>> =
            references.iter().cloned().map(Some).collect();

        let client = Arc::clone(&self.client);
        let spawner = Arc::clone(&self.spawner);
        let state = Arc::clone(&self.state);
        let epoch = Arc::clone(&self.epoch);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(deps, move || {
            if references.is_empty() {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                return None;
            }

            state.lock().unwrap().begin_loading(references.len());
            observers.notify(&());

            let current = epoch.load(Ordering::SeqCst);
            for (index, reference) in references.into_iter().enumerate() {
                let client = Arc::clone(&client);
                let state = Arc::clone(&state);
                let observers = observers.clone();
                let epoch = Arc::clone(&epoch);
                let snapshot_options = options.snapshot;
                let throw_error = options.throw_error;

                spawner.spawn(Box::pin(async move {
                    let result = client.get_document(&reference, &snapshot_options).await;
                    if epoch.load(Ordering::SeqCst) != current {
                        return;
                    }
                    match result {
                        Ok(snapshot) => {
                            {
                                let mut state = state.lock().unwrap();
                                state.data[index] = snapshot;
                                state.settle(index);
                            }
                            observers.notify(&());
                        }
                        Err(error) => {
                            {
                                let mut state = state.lock().unwrap();
                                state.settle(index);
                                if !throw_error {
                                    state.errors.push(error.clone());
                                }
                            }
                            if throw_error {
                                propagate_error(&observers, &error);
                            }
                            observers.notify(&());
                        }
                    }
                }));
            }

            let cleanup_epoch = epoch;
            Some(Box::new(move || {
                cleanup_epoch.fetch_add(1, Ordering::SeqCst);
            }) as Cleanup)
        });
    }

    pub fn data(&self) -> Vec<Option<C::Document>> {
        self.state.lock().unwrap().data.clone()
    }

    pub fn errors(&self) -> Vec<FirestoreError> {
        self.state.lock().unwrap().errors.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<C: FirestoreClient> Drop for DocumentsOnce<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}
