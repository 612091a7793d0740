use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::client::StorageClient;
use crate::storage::error::{object_not_found, StorageResult};

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, Bytes>,
    blob_reads: usize,
}

/// In-memory blob store standing in for the real client.
pub struct FakeStorage {
    inner: Mutex<Inner>,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
        })
    }

    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .blobs
            .insert(path.to_string(), Bytes::copy_from_slice(bytes));
    }

    pub fn blob_reads(&self) -> usize {
        self.inner.lock().unwrap().blob_reads
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn get_blob(&self, path: &str) -> StorageResult<Bytes> {
        let mut inner = self.inner.lock().unwrap();
        inner.blob_reads += 1;
        inner
            .blobs
            .get(path)
            .cloned()
            .ok_or_else(|| object_not_found(path))
    }
}
