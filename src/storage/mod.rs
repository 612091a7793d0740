//! Reactive binding over a blob store client.

pub mod blob;
pub mod client;
pub mod error;

pub use blob::StorageBlob;
pub use client::StorageClient;
pub use error::{StorageError, StorageErrorCode, StorageResult};
