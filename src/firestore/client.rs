use std::sync::Arc;

use async_trait::async_trait;

use crate::firestore::error::{FirestoreError, FirestoreResult};
use crate::firestore::options::SnapshotOptions;
use crate::reactive::Unsubscribe;

/// Callback pair handed to the streaming listen calls.
///
/// `next` receives every materialized snapshot the backend emits for the
/// subscription, in emission order; `error` receives a terminal failure.
pub struct ListenObserver<T> {
    next: Arc<dyn Fn(T) + Send + Sync + 'static>,
    error: Arc<dyn Fn(FirestoreError) + Send + Sync + 'static>,
}

impl<T> ListenObserver<T> {
    pub fn new<N, E>(next: N, error: E) -> Self
    where
        N: Fn(T) + Send + Sync + 'static,
        E: Fn(FirestoreError) + Send + Sync + 'static,
    {
        Self {
            next: Arc::new(next),
            error: Arc::new(error),
        }
    }

    pub fn deliver(&self, value: T) {
        (self.next)(value);
    }

    pub fn fail(&self, error: FirestoreError) {
        (self.error)(error);
    }
}

impl<T> Clone for ListenObserver<T> {
    fn clone(&self) -> Self {
        Self {
            next: Arc::clone(&self.next),
            error: Arc::clone(&self.error),
        }
    }
}

/// The document database surface the bindings consume.
///
/// Implemented by an adapter over the real SDK; everything behind this trait
/// (wire protocol, query execution, local cache, reconnection) is the
/// backend's own engineering and out of scope here. Reference and query
/// handles are opaque: two independently constructed handles can denote the
/// same remote document or query, so equality goes through the client's own
/// predicates and never through pointer identity.
#[async_trait]
pub trait FirestoreClient: Send + Sync + 'static {
    type DocumentRef: Clone + Send + Sync + 'static;
    type Query: Clone + Send + Sync + 'static;
    type Document: Clone + Send + Sync + 'static;

    fn ref_equal(&self, left: &Self::DocumentRef, right: &Self::DocumentRef) -> bool;

    fn query_equal(&self, left: &Self::Query, right: &Self::Query) -> bool;

    /// Returns a copy of `query` constrained to at most `limit` results.
    ///
    /// The pagination bindings rely on this to over-fetch by exactly one
    /// item; an adapter for a backend where that is unsafe should surface
    /// the problem here rather than let the probe silently misbehave.
    fn with_limit(&self, query: &Self::Query, limit: usize) -> Self::Query;

    /// Opens a snapshot stream for one document. `None` snapshots mean the
    /// document does not exist on the backend.
    fn listen_document(
        &self,
        reference: &Self::DocumentRef,
        options: &SnapshotOptions,
        observer: ListenObserver<Option<Self::Document>>,
    ) -> Unsubscribe;

    /// Opens a snapshot stream for a query's result set.
    fn listen_query(
        &self,
        query: &Self::Query,
        options: &SnapshotOptions,
        observer: ListenObserver<Vec<Self::Document>>,
    ) -> Unsubscribe;

    /// One-shot read of a single document.
    async fn get_document(
        &self,
        reference: &Self::DocumentRef,
        options: &SnapshotOptions,
    ) -> FirestoreResult<Option<Self::Document>>;

    /// One-shot read of a query's result set.
    async fn get_query(
        &self,
        query: &Self::Query,
        options: &SnapshotOptions,
    ) -> FirestoreResult<Vec<Self::Document>>;
}
