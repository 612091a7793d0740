use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::compare::DeepCompareEffect;
use super::effect::Cleanup;
use super::observe::{ObserverSet, PartialObserver, Unsubscribe};
use super::spawn::SharedSpawner;

/// Loading/data/error state over any zero-argument asynchronous call.
///
/// `run` re-invokes the call whenever the dependency value changes
/// (structural comparison); settled values land in `data`, rejections in
/// `error` with the prior data left untouched. A monotonically growing epoch
/// suppresses state writes from calls whose dependency snapshot is no longer
/// current, so a slow first call can never overwrite the result of a faster
/// successor ("out-of-order completion").
pub struct AsyncState<T, E, D: PartialEq> {
    state: Arc<Mutex<AsyncValue<T, E>>>,
    effect: DeepCompareEffect<D>,
    epoch: Arc<AtomicU64>,
    spawner: SharedSpawner,
    observers: ObserverSet<()>,
}

struct AsyncValue<T, E> {
    loading: bool,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E, D> AsyncState<T, E, D>
where
    T: Send + 'static,
    E: Send + 'static,
    D: PartialEq,
{
    pub fn new(spawner: SharedSpawner) -> Self {
        Self {
            state: Arc::new(Mutex::new(AsyncValue {
                loading: true,
                data: None,
                error: None,
            })),
            effect: DeepCompareEffect::new(),
            epoch: Arc::new(AtomicU64::new(0)),
            spawner,
            observers: ObserverSet::new(),
        }
    }

    /// Invokes `task` when `deps` differs from the previous invocation's.
    pub fn run<F, Fut>(&mut self, deps: D, task: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let epoch = Arc::clone(&self.epoch);
        let spawner = Arc::clone(&self.spawner);
        let observers = self.observers.clone();

        self.effect.run(deps, move || {
            let current = epoch.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut value = state.lock().unwrap();
                value.loading = true;
            }
            observers.notify(&());

            let future = task();
            let continuation_state = Arc::clone(&state);
            let continuation_epoch = Arc::clone(&epoch);
            let continuation_observers = observers.clone();
            spawner.spawn(Box::pin(async move {
                let result = future.await;
                if continuation_epoch.load(Ordering::SeqCst) != current {
                    return;
                }
                {
                    let mut value = continuation_state.lock().unwrap();
                    match result {
                        Ok(data) => {
                            value.data = Some(data);
                            value.error = None;
                        }
                        Err(error) => value.error = Some(error),
                    }
                    value.loading = false;
                }
                continuation_observers.notify(&());
            }));

            let cleanup_epoch = Arc::clone(&epoch);
            Some(Box::new(move || {
                cleanup_epoch.fetch_add(1, Ordering::SeqCst);
            }) as Cleanup)
        });
    }

    pub fn loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn data(&self) -> Option<T>
    where
        T: Clone,
    {
        self.state.lock().unwrap().data.clone()
    }

    pub fn error(&self) -> Option<E>
    where
        E: Clone,
    {
        self.state.lock().unwrap().error.clone()
    }

    /// Registers an observer notified on every state change.
    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<T, E, D: PartialEq> Drop for AsyncState<T, E, D> {
    fn drop(&mut self) {
        self.effect.teardown();
        self.observers.notify_complete();
    }
}
