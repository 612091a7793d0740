use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::firestore::client::{FirestoreClient, ListenObserver};
use crate::firestore::effects::RefsEffect;
use crate::firestore::error::FirestoreError;
use crate::firestore::options::BindingOptions;
use crate::firestore::state::{propagate_error, FetchState};
use crate::reactive::{Cleanup, ObserverSet, PartialObserver, SharedSpawner, Unsubscribe};

/// Streaming view of one document.
///
/// Owns at most one snapshot subscription at a time, keyed by the reference
/// handed to [`set_source`]. The subscription stays open for the life of the
/// key and every snapshot the backend emits re-enters the ready state.
///
/// [`set_source`]: LiveDocument::set_source
pub struct LiveDocument<C: FirestoreClient> {
    client: Arc<C>,
    options: BindingOptions,
    state: Arc<Mutex<FetchState<Option<C::Document>>>>,
    effect: RefsEffect<C>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> LiveDocument<C> {
    pub fn bind(client: Arc<C>, options: BindingOptions) -> Self {
        Self {
            effect: RefsEffect::new(Arc::clone(&client)),
            client,
            options,
            state: Arc::new(Mutex::new(FetchState::idle())),
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at `reference`, or at nothing.
    ///
    /// Called on every render-equivalent; an equal reference (under the
    /// client's equality) is a no-op, a changed one tears the previous
    /// subscription down before the new cycle starts, and `None` resets the
    /// binding to idle.
    pub fn set_source(&mut self, reference: Option<C::DocumentRef>) {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(vec![reference.clone()], move || match reference {
            None => {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                None
            }
            Some(reference) => {
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

                let unsubscribe = client.listen_document(
                    &reference,
                    &options.snapshot,
                    ListenObserver::new(
                        move |snapshot: Option<C::Document>| {
                            if !next_relevant.load(Ordering::SeqCst) {
                                return;
                            }
                            {
                                let mut state = next_state.lock().unwrap();
                                state.data = snapshot;
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

                log::debug!("document listen opened");
                Some(Box::new(move || {
                    relevant.store(false, Ordering::SeqCst);
                    unsubscribe();
                    log::debug!("document listen closed");
                }) as Cleanup)
            }
        });
    }

    /// The last delivered snapshot's data; `None` while idle, loading, or
    /// when the document does not exist.
    pub fn data(&self) -> Option<C::Document> {
        self.state.lock().unwrap().data.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    pub fn error(&self) -> Option<FirestoreError> {
        self.state.lock().unwrap().error.clone()
    }

    /// Registers an observer notified on every state change.
    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<C: FirestoreClient> Drop for LiveDocument<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}

/// One-shot view of one document.
///
/// Issues exactly one read per distinct reference; unrelated re-render calls
/// with an equal reference never reach the backend. [`refetch`] re-issues
/// the read for the current reference on demand.
///
/// [`refetch`]: DocumentOnce::refetch
pub struct DocumentOnce<C: FirestoreClient> {
    client: Arc<C>,
    spawner: SharedSpawner,
    options: BindingOptions,
    state: Arc<Mutex<FetchState<Option<C::Document>>>>,
    effect: RefsEffect<C>,
    epoch: Arc<AtomicU64>,
    current: Option<C::DocumentRef>,
    observers: ObserverSet<()>,
}

impl<C: FirestoreClient> DocumentOnce<C> {
    pub fn bind(client: Arc<C>, spawner: SharedSpawner, options: BindingOptions) -> Self {
        Self {
            effect: RefsEffect::new(Arc::clone(&client)),
            client,
            spawner,
            options,
            state: Arc::new(Mutex::new(FetchState::idle())),
            epoch: Arc::new(AtomicU64::new(0)),
            current: None,
            observers: ObserverSet::new(),
        }
    }

    /// Points the binding at `reference`; a changed reference supersedes any
    /// outstanding read (its completion is discarded).
    pub fn set_source(&mut self, reference: Option<C::DocumentRef>) {
        self.current = reference.clone();

        let client = Arc::clone(&self.client);
        let spawner = Arc::clone(&self.spawner);
        let state = Arc::clone(&self.state);
        let epoch = Arc::clone(&self.epoch);
        let observers = self.observers.clone();
        let options = self.options.clone();

        self.effect.run(vec![reference.clone()], move || match reference {
            None => {
                state.lock().unwrap().reset_idle();
                observers.notify(&());
                None
            }
            Some(reference) => {
                state.lock().unwrap().begin_loading();
                observers.notify(&());
                spawn_document_read(
                    &client, &spawner, &state, &observers, &epoch, reference, &options,
                );

                let cleanup_epoch = epoch;
                Some(Box::new(move || {
                    cleanup_epoch.fetch_add(1, Ordering::SeqCst);
                }) as Cleanup)
            }
        });
    }

    /// Re-issues the read for the current reference.
    ///
    /// No-op while a read is outstanding or while no reference is set. The
    /// previous data stays visible until the fresh result lands; a captured
    /// error is cleared.
    pub fn refetch(&self) {
        let reference = match &self.current {
            Some(reference) => reference.clone(),
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
        spawn_document_read(
            &self.client,
            &self.spawner,
            &self.state,
            &self.observers,
            &self.epoch,
            reference,
            &self.options,
        );
    }

    pub fn data(&self) -> Option<C::Document> {
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
}

impl<C: FirestoreClient> Drop for DocumentOnce<C> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}

fn spawn_document_read<C: FirestoreClient>(
    client: &Arc<C>,
    spawner: &SharedSpawner,
    state: &Arc<Mutex<FetchState<Option<C::Document>>>>,
    observers: &ObserverSet<()>,
    epoch: &Arc<AtomicU64>,
    reference: C::DocumentRef,
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
        let result = client.get_document(&reference, &snapshot_options).await;
        if epoch.load(Ordering::SeqCst) != current {
            return;
        }
        match result {
            Ok(snapshot) => {
                {
                    let mut state = state.lock().unwrap();
                    state.data = snapshot;
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
