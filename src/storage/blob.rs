use std::sync::Arc;

use bytes::Bytes;

use crate::reactive::{AsyncState, PartialObserver, SharedSpawner, Unsubscribe};
use crate::storage::client::StorageClient;
use crate::storage::error::StorageError;

/// One-shot view of a stored blob, keyed by its path.
///
/// A `None` path resolves to empty data without touching the client; a new
/// path re-fetches through the client's one-shot read. Staleness handling
/// (a slow fetch finishing after the path moved on) comes from the wrapped
/// [`AsyncState`].
pub struct StorageBlob<S: StorageClient> {
    client: Arc<S>,
    state: AsyncState<Option<Bytes>, StorageError, Option<String>>,
}

impl<S: StorageClient> StorageBlob<S> {
    pub fn bind(client: Arc<S>, spawner: SharedSpawner) -> Self {
        Self {
            client,
            state: AsyncState::new(spawner),
        }
    }

    /// Points the binding at a blob path, or at nothing.
    pub fn set_path(&mut self, path: Option<String>) {
        let client = Arc::clone(&self.client);
        self.state.run(path.clone(), move || async move {
            match path {
                None => Ok(None),
                Some(path) => client.get_blob(&path).await.map(Some),
            }
        });
    }

    pub fn data(&self) -> Option<Bytes> {
        self.state.data().flatten()
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn error(&self) -> Option<StorageError> {
        self.state.error()
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.state.subscribe(observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::object_not_found;
    use crate::test_support::{FakeStorage, QueueSpawner};

    #[test]
    fn null_path_resolves_without_touching_the_client() {
        let client = FakeStorage::new();
        let spawner = QueueSpawner::new();
        let mut binding = StorageBlob::bind(Arc::clone(&client), spawner.clone());

        binding.set_path(None);
        spawner.drain();

        assert!(!binding.loading());
        assert_eq!(binding.data(), None);
        assert_eq!(client.blob_reads(), 0);
    }

    #[test]
    fn existing_blob_is_fetched_once_per_path() {
        let client = FakeStorage::new();
        let spawner = QueueSpawner::new();
        client.put("avatars/alice.png", b"png-bytes".as_slice());
        let mut binding = StorageBlob::bind(Arc::clone(&client), spawner.clone());

        binding.set_path(Some("avatars/alice.png".to_string()));
        assert!(binding.loading());
        spawner.drain();

        assert!(!binding.loading());
        assert_eq!(binding.data(), Some(Bytes::from_static(b"png-bytes")));
        assert_eq!(client.blob_reads(), 1);

        binding.set_path(Some("avatars/alice.png".to_string()));
        assert_eq!(spawner.pending(), 0);
        assert_eq!(client.blob_reads(), 1);
    }

    #[test]
    fn missing_blob_reports_the_backend_error() {
        let client = FakeStorage::new();
        let spawner = QueueSpawner::new();
        let mut binding = StorageBlob::bind(Arc::clone(&client), spawner.clone());

        binding.set_path(Some("missing.png".to_string()));
        spawner.drain();

        assert!(!binding.loading());
        assert_eq!(binding.data(), None);
        assert_eq!(
            binding.error(),
            Some(object_not_found("missing.png"))
        );
    }

    #[test]
    fn path_change_replaces_the_blob() {
        let client = FakeStorage::new();
        let spawner = QueueSpawner::new();
        client.put("a.bin", b"aaa".as_slice());
        client.put("b.bin", b"bbb".as_slice());
        let mut binding = StorageBlob::bind(Arc::clone(&client), spawner.clone());

        binding.set_path(Some("a.bin".to_string()));
        spawner.drain();
        assert_eq!(binding.data(), Some(Bytes::from_static(b"aaa")));

        binding.set_path(Some("b.bin".to_string()));
        spawner.drain();
        assert_eq!(binding.data(), Some(Bytes::from_static(b"bbb")));
        assert_eq!(client.blob_reads(), 2);
    }
}
