use async_trait::async_trait;

use crate::auth::error::AuthResult;
use crate::auth::model::{AuthUser, IdTokenResult};
use crate::reactive::{PartialObserver, Unsubscribe};

/// The authentication surface the session binding consumes.
///
/// Implemented by an adapter over the real provider SDK. The identity/token
/// stream is a single combined subscription: one event per sign-in,
/// sign-out, or token refresh, carrying the identity current at that moment
/// (`None` when signed out). Registration delivers the current identity
/// immediately, then every subsequent change in emission order.
#[async_trait]
pub trait AuthClient: Send + Sync + 'static {
    fn on_id_token_changed(&self, observer: PartialObserver<Option<AuthUser>>) -> Unsubscribe;

    /// Retrieves the token result (including custom claims) for `user`,
    /// forcing a refresh against the provider when asked.
    async fn get_id_token_result(
        &self,
        user: &AuthUser,
        force_refresh: bool,
    ) -> AuthResult<IdTokenResult>;

    async fn sign_out(&self) -> AuthResult<()>;
}
