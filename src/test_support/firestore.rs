use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::firestore::client::{FirestoreClient, ListenObserver};
use crate::firestore::error::{FirestoreError, FirestoreResult};
use crate::firestore::options::SnapshotOptions;
use crate::reactive::Unsubscribe;

/// Opaque document handle of the fake backend.
///
/// Deliberately a plain value so every call site can rebuild one, the way a
/// render rebuilds its handles; equality is path equality via the client.
#[derive(Clone, Debug)]
pub struct FakeDocumentRef {
    path: String,
}

/// Opaque query handle of the fake backend: one collection, optionally
/// limited. Results are ordered by document path.
#[derive(Clone, Debug)]
pub struct FakeQuery {
    collection: String,
    limit: Option<usize>,
}

impl FakeQuery {
    pub fn collection(path: &str) -> Self {
        Self {
            collection: path.to_string(),
            limit: None,
        }
    }
}

struct DocListener {
    id: u64,
    path: String,
    observer: ListenObserver<Option<Value>>,
}

struct QueryListener {
    id: u64,
    query: FakeQuery,
    observer: ListenObserver<Vec<Value>>,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, Value>,
    doc_listeners: Vec<DocListener>,
    query_listeners: Vec<QueryListener>,
    next_id: u64,
    deliver_initial: bool,
    paused: bool,
    waiters: Vec<async_channel::Sender<()>>,
    document_listen_total: usize,
    document_reads: usize,
    query_reads: usize,
    fail_next_query_read: Option<FirestoreError>,
    last_snapshot_options: Option<SnapshotOptions>,
    last_query_limit: Option<usize>,
}

/// In-memory document database standing in for the real client.
///
/// Listens deliver the current snapshot at registration (like the real
/// backend) unless `set_deliver_initial(false)`; writes notify every
/// matching listener synchronously.
pub struct FakeFirestore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeFirestore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner {
                deliver_initial: true,
                ..Inner::default()
            })),
        })
    }

    pub fn doc(&self, path: &str) -> FakeDocumentRef {
        FakeDocumentRef {
            path: path.to_string(),
        }
    }

    /// Writes a document and notifies every matching listener.
    pub fn set_doc(&self, path: &str, value: Value) {
        let mut deliveries: Vec<Box<dyn FnOnce() + Send>> = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap();
            inner.documents.insert(path.to_string(), value.clone());

            for listener in &inner.doc_listeners {
                if listener.path == path {
                    let observer = listener.observer.clone();
                    let value = value.clone();
                    deliveries.push(Box::new(move || observer.deliver(Some(value))));
                }
            }
            let collection = parent_collection(path);
            for listener in &inner.query_listeners {
                if listener.query.collection == collection {
                    let observer = listener.observer.clone();
                    let results = results_for(&inner.documents, &listener.query);
                    deliveries.push(Box::new(move || observer.deliver(results)));
                }
            }
        }
        for delivery in deliveries {
            delivery();
        }
    }

    /// Delivers a failure to every listener of `path`.
    pub fn fail_document(&self, path: &str, error: FirestoreError) {
        let observers: Vec<_> = {
            let inner = self.inner.lock().unwrap();
            inner
                .doc_listeners
                .iter()
                .filter(|listener| listener.path == path)
                .map(|listener| listener.observer.clone())
                .collect()
        };
        for observer in observers {
            observer.fail(error.clone());
        }
    }

    /// Re-delivers the current result set to every query listener; used
    /// together with `set_deliver_initial(false)` to control timing.
    pub fn emit_query_snapshots(&self) {
        let deliveries: Vec<_> = {
            let inner = self.inner.lock().unwrap();
            inner
                .query_listeners
                .iter()
                .map(|listener| {
                    (
                        listener.observer.clone(),
                        results_for(&inner.documents, &listener.query),
                    )
                })
                .collect()
        };
        for (observer, results) in deliveries {
            observer.deliver(results);
        }
    }

    pub fn set_deliver_initial(&self, deliver: bool) {
        self.inner.lock().unwrap().deliver_initial = deliver;
    }

    /// Makes one-shot reads wait until `release_reads`. Release before
    /// draining the spawner.
    pub fn pause_reads(&self) {
        self.inner.lock().unwrap().paused = true;
    }

    pub fn release_reads(&self) {
        let waiters = {
            let mut inner = self.inner.lock().unwrap();
            inner.paused = false;
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            let _ = waiter.try_send(());
        }
    }

    pub fn fail_next_query_read(&self, error: FirestoreError) {
        self.inner.lock().unwrap().fail_next_query_read = Some(error);
    }

    pub fn document_listen_count(&self) -> usize {
        self.inner.lock().unwrap().doc_listeners.len()
    }

    pub fn document_listen_total(&self) -> usize {
        self.inner.lock().unwrap().document_listen_total
    }

    pub fn query_listen_count(&self) -> usize {
        self.inner.lock().unwrap().query_listeners.len()
    }

    pub fn document_reads(&self) -> usize {
        self.inner.lock().unwrap().document_reads
    }

    pub fn query_reads(&self) -> usize {
        self.inner.lock().unwrap().query_reads
    }

    pub fn last_snapshot_options(&self) -> Option<SnapshotOptions> {
        self.inner.lock().unwrap().last_snapshot_options
    }

    pub fn last_query_limit(&self) -> Option<usize> {
        self.inner.lock().unwrap().last_query_limit
    }

    async fn wait_if_paused(&self) {
        let receiver = {
            let mut inner = self.inner.lock().unwrap();
            if inner.paused {
                let (sender, receiver) = async_channel::bounded(1);
                inner.waiters.push(sender);
                Some(receiver)
            } else {
                None
            }
        };
        if let Some(receiver) = receiver {
            let _ = receiver.recv().await;
        }
    }
}

fn parent_collection(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((collection, _)) => collection.to_string(),
        None => String::new(),
    }
}

fn results_for(documents: &BTreeMap<String, Value>, query: &FakeQuery) -> Vec<Value> {
    let prefix = format!("{}/", query.collection);
    let mut results: Vec<Value> = documents
        .iter()
        .filter(|(path, _)| path.starts_with(&prefix) && !path[prefix.len()..].contains('/'))
        .map(|(_, value)| value.clone())
        .collect();
    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    results
}

#[async_trait]
impl FirestoreClient for FakeFirestore {
    type DocumentRef = FakeDocumentRef;
    type Query = FakeQuery;
    type Document = Value;

    fn ref_equal(&self, left: &FakeDocumentRef, right: &FakeDocumentRef) -> bool {
        left.path == right.path
    }

    fn query_equal(&self, left: &FakeQuery, right: &FakeQuery) -> bool {
        left.collection == right.collection && left.limit == right.limit
    }

    fn with_limit(&self, query: &FakeQuery, limit: usize) -> FakeQuery {
        FakeQuery {
            collection: query.collection.clone(),
            limit: Some(limit),
        }
    }

    fn listen_document(
        &self,
        reference: &FakeDocumentRef,
        options: &SnapshotOptions,
        observer: ListenObserver<Option<Value>>,
    ) -> Unsubscribe {
        let (id, initial) = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.document_listen_total += 1;
            inner.last_snapshot_options = Some(*options);
            inner.doc_listeners.push(DocListener {
                id,
                path: reference.path.clone(),
                observer: observer.clone(),
            });
            let initial = inner
                .deliver_initial
                .then(|| inner.documents.get(&reference.path).cloned());
            (id, initial)
        };
        if let Some(snapshot) = initial {
            observer.deliver(snapshot);
        }

        let handle = Arc::clone(&self.inner);
        Box::new(move || {
            handle
                .lock()
                .unwrap()
                .doc_listeners
                .retain(|listener| listener.id != id);
        })
    }

    fn listen_query(
        &self,
        query: &FakeQuery,
        options: &SnapshotOptions,
        observer: ListenObserver<Vec<Value>>,
    ) -> Unsubscribe {
        let (id, initial) = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.last_snapshot_options = Some(*options);
            inner.last_query_limit = query.limit;
            inner.query_listeners.push(QueryListener {
                id,
                query: query.clone(),
                observer: observer.clone(),
            });
            let initial = inner
                .deliver_initial
                .then(|| results_for(&inner.documents, query));
            (id, initial)
        };
        if let Some(results) = initial {
            observer.deliver(results);
        }

        let handle = Arc::clone(&self.inner);
        Box::new(move || {
            handle
                .lock()
                .unwrap()
                .query_listeners
                .retain(|listener| listener.id != id);
        })
    }

    async fn get_document(
        &self,
        reference: &FakeDocumentRef,
        options: &SnapshotOptions,
    ) -> FirestoreResult<Option<Value>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.document_reads += 1;
            inner.last_snapshot_options = Some(*options);
        }
        self.wait_if_paused().await;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .documents
            .get(&reference.path)
            .cloned())
    }

    async fn get_query(
        &self,
        query: &FakeQuery,
        options: &SnapshotOptions,
    ) -> FirestoreResult<Vec<Value>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.query_reads += 1;
            inner.last_snapshot_options = Some(*options);
            inner.last_query_limit = query.limit;
            if let Some(error) = inner.fail_next_query_read.take() {
                return Err(error);
            }
        }
        self.wait_if_paused().await;
        let inner = self.inner.lock().unwrap();
        Ok(results_for(&inner.documents, query))
    }
}
