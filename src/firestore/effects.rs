use std::sync::Arc;

use crate::firestore::client::FirestoreClient;
use crate::reactive::{Cleanup, CustomCompareEffect};

/// Ordered comparison of two reference lists under the client's own equality.
///
/// Equal iff same length and, pairwise in order, each slot is either empty on
/// both sides or populated on both sides with references the client judges
/// equal. Reordering two equal-content lists is a change: position determines
/// which slot of a multi-document binding a reference feeds.
pub fn refs_equal<C: FirestoreClient>(
    client: &C,
    left: &[Option<C::DocumentRef>],
    right: &[Option<C::DocumentRef>],
) -> bool {
    left.len() == right.len()
        && left.iter().zip(right.iter()).all(|(a, b)| match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => client.ref_equal(a, b),
            _ => false,
        })
}

/// Ordered comparison of two query lists under the client's own equality.
pub fn queries_equal<C: FirestoreClient>(
    client: &C,
    left: &[Option<C::Query>],
    right: &[Option<C::Query>],
) -> bool {
    left.len() == right.len()
        && left.iter().zip(right.iter()).all(|(a, b)| match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => client.query_equal(a, b),
            _ => false,
        })
}

/// Effect cell keyed by an ordered list of document references.
pub struct RefsEffect<C: FirestoreClient> {
    client: Arc<C>,
    inner: CustomCompareEffect<Vec<Option<C::DocumentRef>>>,
}

impl<C: FirestoreClient> RefsEffect<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            inner: CustomCompareEffect::new(),
        }
    }

    pub fn run<F>(&mut self, refs: Vec<Option<C::DocumentRef>>, effect: F)
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        let client = Arc::clone(&self.client);
        self.inner.run(
            refs,
            move |previous, next| refs_equal(client.as_ref(), previous, next),
            effect,
        );
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}

/// Effect cell keyed by an ordered list of queries.
pub struct QueriesEffect<C: FirestoreClient> {
    client: Arc<C>,
    inner: CustomCompareEffect<Vec<Option<C::Query>>>,
}

impl<C: FirestoreClient> QueriesEffect<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            inner: CustomCompareEffect::new(),
        }
    }

    pub fn run<F>(&mut self, queries: Vec<Option<C::Query>>, effect: F)
    where
        F: FnOnce() -> Option<Cleanup>,
    {
        let client = Arc::clone(&self.client);
        self.inner.run(
            queries,
            move |previous, next| queries_equal(client.as_ref(), previous, next),
            effect,
        );
    }

    pub fn teardown(&mut self) {
        self.inner.teardown();
    }
}
