//! Reactive binding over an authentication client's session state.

pub mod client;
pub mod cookie;
pub mod error;
pub mod model;
pub mod session;

pub use client::AuthClient;
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub use cookie::DocumentCookieStore;
pub use cookie::{CookieStore, MemoryCookieStore};
pub use error::{AuthError, AuthResult};
pub use model::{users_equal, AuthUser, IdTokenResult};
pub use session::{AuthSession, AuthSessionOptions, TokenClaims};
