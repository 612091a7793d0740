//! Generic effect and async-state primitives underneath the product bindings.
//!
//! Nothing in this module knows about Firebase: it provides the re-run-on-
//! custom-equality effect cell, its deep-equality variant, the async-call
//! state wrapper, the observer plumbing every binding republishes through,
//! and the spawner seam bindings hand continuations to.

pub mod async_state;
pub mod compare;
pub mod effect;
pub mod observe;
pub mod spawn;

pub use async_state::AsyncState;
pub use compare::{CustomCompareEffect, DeepCompareEffect};
pub use effect::{Cleanup, DepsEffect};
pub use observe::{ObserverSet, PartialObserver, Unsubscribe};
#[cfg(not(target_arch = "wasm32"))]
pub use spawn::TokioSpawner;
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub use spawn::WasmSpawner;
pub use spawn::{SharedSpawner, TaskSpawner};
