use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::error::StorageResult;

/// The blob store surface the storage binding consumes.
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Downloads the object stored at `path`.
    async fn get_blob(&self, path: &str) -> StorageResult<Bytes>;
}
