use std::error::Error;
use std::sync::{Arc, Mutex};

pub type NextFn<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;
pub type ErrorFn = Arc<dyn Fn(&dyn Error) + Send + Sync + 'static>;
pub type CompleteFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// Callback triple handed to the `subscribe` registration point of a binding.
///
/// `next` receives every state-change notification, `error` receives failures
/// that the binding propagates instead of capturing (see `throw_error`), and
/// `complete` fires when the binding is dropped.
pub struct PartialObserver<T> {
    pub next: Option<NextFn<T>>,
    pub error: Option<ErrorFn>,
    pub complete: Option<CompleteFn>,
}

impl<T> PartialObserver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_next<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.next = Some(Arc::new(callback));
        self
    }

    pub fn with_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&dyn Error) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(callback));
        self
    }

    pub fn with_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.complete = Some(Arc::new(callback));
        self
    }
}

impl<T> Clone for PartialObserver<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> Default for PartialObserver<T> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }
}

pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;

/// Registered observers of one binding instance.
///
/// Every internal state mutation of a binding is republished through its
/// `ObserverSet` so a host framework can schedule re-renders. Notification
/// never happens while the binding's state lock is held.
pub struct ObserverSet<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

struct Registry<T> {
    next_id: u64,
    observers: Vec<(u64, PartialObserver<T>)>,
}

impl<T: 'static> ObserverSet<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    /// Registers a new observer and returns the closure that removes it.
    pub fn subscribe(&self, observer: PartialObserver<T>) -> Unsubscribe {
        let id = {
            let mut registry = self.inner.lock().unwrap();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.push((id, observer));
            id
        };
        let inner = Arc::clone(&self.inner);
        Box::new(move || {
            inner
                .lock()
                .unwrap()
                .observers
                .retain(|(entry_id, _)| *entry_id != id);
        })
    }

    /// Notifies all observers with the provided value.
    pub fn notify(&self, value: &T) {
        for observer in self.snapshot() {
            if let Some(next) = observer.next {
                next(value);
            }
        }
    }

    /// Delivers a failure to every observer that registered an error callback.
    ///
    /// Returns whether at least one observer handled it, so the caller can
    /// decide what to do with an otherwise-unrouted failure.
    pub fn notify_error(&self, error: &dyn Error) -> bool {
        let mut handled = false;
        for observer in self.snapshot() {
            if let Some(callback) = observer.error {
                callback(error);
                handled = true;
            }
        }
        handled
    }

    /// Signals that the owning binding is going away.
    pub fn notify_complete(&self) {
        for observer in self.snapshot() {
            if let Some(complete) = observer.complete {
                complete();
            }
        }
    }

    fn snapshot(&self) -> Vec<PartialObserver<T>> {
        self.inner
            .lock()
            .unwrap()
            .observers
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }
}

impl<T> Clone for ObserverSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for ObserverSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
