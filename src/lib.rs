//! Reactive data bindings over the Firebase SDK surface.
//!
//! This crate republishes a document database's query results, single
//! documents, an authentication session, and stored blobs as reactive
//! values a component-based UI can own. Each binding is created for the
//! life of a component, driven with the current handle on every render
//! (`set_source`/`set_query`/`set_path`), read through `data`/`loading`/
//! `error` getters, observed through `subscribe`, and torn down on drop.
//!
//! The backend clients are injected through trait seams
//! ([`firestore::FirestoreClient`], [`auth::AuthClient`],
//! [`storage::StorageClient`]); everything behind them (wire protocol,
//! query execution, caching, token issuance, blob transfer) belongs to the
//! real SDK adapters and is out of scope here. Handle equality is always
//! the backend's own: rebuilding a reference or query on every render
//! never tears a subscription down.

pub mod auth;
pub mod firestore;
pub mod reactive;
pub mod storage;

#[cfg(test)]
pub mod test_support;
