//! Reactive bindings over a document database client.
//!
//! Each binding subscribes to (or reads from) the injected
//! [`FirestoreClient`] keyed by an opaque reference or query handle, buffers
//! the delivered snapshots into render-scoped `{data, loading, error}` state,
//! and republishes every change to its registered observers. Handle equality
//! is always the client's own; a handle rebuilt on every render never causes
//! a spurious re-subscribe.

pub mod client;
pub mod collection;
pub mod document;
pub mod documents;
pub mod effects;
pub mod error;
pub mod options;
pub mod paginate;
mod state;

pub use client::{FirestoreClient, ListenObserver};
pub use collection::{CollectionOnce, LiveCollection};
pub use document::{DocumentOnce, LiveDocument};
pub use documents::{DocumentsOnce, LiveDocuments};
pub use effects::{queries_equal, refs_equal, QueriesEffect, RefsEffect};
pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use options::{BindingOptions, PaginateOptions, ServerTimestampBehavior, SnapshotOptions};
pub use paginate::{PaginatedCollection, PaginatedCollectionOnce};
