use std::sync::Arc;

use futures::future::BoxFuture;

/// Seam through which bindings hand continuations to the host executor.
///
/// Bindings never own a runtime: one-shot reads and token refreshes are
/// boxed and handed to whatever spawner the application injected. Native
/// targets use a Tokio handle, wasm builds use the browser microtask queue,
/// and tests use a deterministic queue they drain by hand.
pub trait TaskSpawner: Send + Sync + 'static {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

pub type SharedSpawner = Arc<dyn TaskSpawner>;

#[cfg(not(target_arch = "wasm32"))]
pub use native::TokioSpawner;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::TaskSpawner;
    use futures::future::BoxFuture;
    use tokio::runtime::Handle;

    /// Spawns binding continuations onto a Tokio runtime.
    #[derive(Clone)]
    pub struct TokioSpawner {
        handle: Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Captures the runtime the caller is currently executing inside.
        ///
        /// # Panics
        ///
        /// Panics when called outside a Tokio runtime, as
        /// [`Handle::current`] does.
        pub fn current() -> Self {
            Self {
                handle: Handle::current(),
            }
        }
    }

    impl TaskSpawner for TokioSpawner {
        fn spawn(&self, task: BoxFuture<'static, ()>) {
            let _ = self.handle.spawn(task);
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub use wasm::WasmSpawner;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
mod wasm {
    use super::TaskSpawner;
    use futures::future::BoxFuture;

    /// Spawns binding continuations onto the browser microtask queue.
    #[derive(Clone, Copy, Default)]
    pub struct WasmSpawner;

    impl TaskSpawner for WasmSpawner {
        fn spawn(&self, task: BoxFuture<'static, ()>) {
            wasm_bindgen_futures::spawn_local(task);
        }
    }
}
