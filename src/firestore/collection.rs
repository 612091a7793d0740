use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::firestore::client::{FirestoreClient, ListenObserver};
use crate::firestore::effects::QueriesEffect;
use crate::firestore::error::FirestoreError;
use crate::firestore::options::BindingOptions;
use crate::firestore::state::{propagate_error, FetchState};
use crate::reactive::{Cleanup, ObserverSet, PartialObserver, SharedSpawner, Unsubscribe};

/// Streaming view of a query's result set.
///
/// Owns at most one snapshot subscription at a time, keyed by the query
/// handed to [`set_query`]; every result-set snapshot the backend emits
/// replaces `data` wholesale.
///
/// [`set_query`]: LiveCollection::set_query
pub struct LiveCollection<C: FirestoreClient> {
    client: Arc<C>,
    options: BindingOptions,
    state: Arc<Mutex<FetchState<Vec<C::Document>>>>,
    effect: QueriesEffect<C>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> LiveCollection<C> {
    pub fn bind(client: Arc<C>, options: BindingOptions) -> Self {
        Self {
            effect: QueriesEffect::new(Arc::clone(&client)),
            client,
            options,
            state: Arc::new(Mutex::new(FetchState::idle())),
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at `query`, or at nothing.
    pub fn set_query(&mut self, query: Option<C::Query>) {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(vec![query.clone()], move || match query {
            None => {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                None
            }
            Some(query) => {
                state.lock().unwrap().begin_loading();
                observers.notify(&());

                let relevant = Arc::new(AtomicBool::new(true));
                let next_state = Arc::clone(&state);
                let next_observers = observers.clone();
                let next_relevant = Arc::clone(&relevant);
                let fail_state = state;
                let fail_observers = observers;
                let fail_relevant = Arc::clone(&relevant);
                let throw_error = options.throw_error;

                let unsubscribe = client.listen_query(
                    &query,
                    &options.snapshot,
                    ListenObserver::new(
                        move |documents: Vec<C::Document>| {
                            if !next_relevant.load(Ordering::SeqCst) {
                                return;
                            }
                            {
                                let mut state = next_state.lock().unwrap();
                                state.data = documents;
                                state.error = None;
                                state.loading = Some(false);
                            }
                            next_observers.notify(&());
                        },
                        move |error: FirestoreError| {
                            if !fail_relevant.load(Ordering::SeqCst) {
                                return;
                            }
                            {
                                let mut state = fail_state.lock().unwrap();
                                state.loading = Some(false);
                                if !throw_error {
                                    state.error = Some(error.clone());
                                }
                            }
                            if throw_error {
                                propagate_error(&fail_observers, &error);
                            }
                            fail_observers.notify(&());
                        },
                    ),
                );

                log::debug!("query listen opened");
                Some(Box::new(move || {
                    relevant.store(false, Ordering::SeqCst);
                    unsubscribe();
                    log::debug!("query listen closed");
                }) as Cleanup)
            }
        });
    }

    /// The last delivered result set, in the backend's emission order.
    pub fn data(&self) -> Vec<C::Document> {
        self.state.lock().unwrap().data.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<FirestoreError> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }

    pub(crate) fn state_handle(&self) -> Arc<Mutex<FetchState<Vec<C::Document>>>> {
        Arc::clone(&self.state)
    }
}

impl<C: FirestoreClient> Drop for LiveCollection<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}

/// One-shot view of a query's result set.
pub struct CollectionOnce<C: FirestoreClient> {
    client: Arc<C>,
    spawner: SharedSpawner,
    options: BindingOptions,
    state: Arc<Mutex<FetchState<Vec<C::Document>>>>,
    effect: QueriesEffect<C>,
    epoch: Arc<AtomicU64>,
    current: Option<C::Query>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> CollectionOnce<C> {
    pub fn bind(client: Arc<C>, spawner: SharedSpawner, options: BindingOptions) -> Self {
        Self {
            effect: QueriesEffect::new(Arc::clone(&client)),
            client,
            spawner,
            options,
            state: Arc::new(Mutex::new(FetchState::idle())),
            epoch: Arc::new(AtomicU64::new(0)),
            current: None,
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at `query`; a changed query supersedes any
    /// outstanding read.
    pub fn set_query(&mut self, query: Option<C::Query>) {
        self.current = query.clone();

        let client = Arc::clone(&self.client);
        let spawner = Arc::clone(&self.spawner);
        let state = Arc::clone(&self.state);
        let epoch = Arc::clone(&self.epoch);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(vec![query.clone()], move || match query {
            None => {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                None
            }
            Some(query) => {
                state.lock().unwrap().begin_loading();
                observers.notify(&());
                spawn_query_read(&client, &spawner, &state, &observers, &epoch, query, &options);

                let cleanup_epoch = epoch;
                Some(Box::new(move || {
                    cleanup_epoch.fetch_add(1, Ordering::SeqCst);
                }) as Cleanup)
            }
        });
    }

    /// Re-issues the read for the current query; no-op while loading or idle.
    pub fn refetch(&self) {
        let query = match &self.current {
            Some(query) => query.clone(),
            None => return,
        };
        {
            let mut state = self.state.lock().unwrap();
            if state.loading == Some(true) {
                return;
            }
            state.loading = Some(true);
            state.error = None;
        }
        self.observers.notify(&());
        spawn_query_read(
            &self.client,
            &self.spawner,
            &self.state,
            &self.observers,
            &self.epoch,
            query,
            &self.options,
        );
    }

    pub fn data(&self) -> Vec<C::Document> {
        self.state.lock().unwrap().data.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<FirestoreError> {
        self.state.lock().unwrap().error.clone()
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }

    pub(crate) fn state_handle(&self) -> Arc<Mutex<FetchState<Vec<C::Document>>>> {
        Arc::clone(&self.state)
    }
}

impl<C: FirestoreClient> Drop for CollectionOnce<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}

fn spawn_query_read<C: FirestoreClient>(
    client: &Arc<C>,
    spawner: &SharedSpawner,
    state: &Arc<Mutex<FetchState<Vec<C::Document>>>>,
    observers: &ObserverSet<()>,
    epoch: &Arc<AtomicU64>,
    query: C::Query,
    options: &BindingOptions,
) {
    let client = Arc::clone(client);
    let state = Arc::clone(state);
    let observers = observers.clone();
    let epoch = Arc::clone(epoch);
    let snapshot_options = options.snapshot;
    let throw_error = options.throw_error;
    let current = epoch.load(Ordering::SeqCst);

    spawner.spawn(Box::pin(async move {
        let result = client.get_query(&query, &snapshot_options).await;
        if epoch.load(Ordering::SeqCst) != current {
            return;
        }
        match result {
            Ok(documents) => {
                {
                    let mut state = state.lock().unwrap();
                    state.data = documents;
                    state.error = None;
                    state.loading = Some(false);
                }
                observers.notify(&());
            }
            Err(error) => {
                {
                    let mut state = state.lock().unwrap();
                    state.loading = Some(false);
                    if !throw_error {
                        state.error = Some(error.clone());
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
