//! Test utilities shared across the crate's unit tests: in-memory fakes for
//! every client seam and a deterministic task spawner.

pub mod auth;
pub mod firestore;
pub mod spawn;
pub mod storage;

pub use auth::FakeAuth;
pub use firestore::{FakeDocumentRef, FakeFirestore, FakeQuery};
pub use spawn::QueueSpawner;
pub use storage::FakeStorage;
