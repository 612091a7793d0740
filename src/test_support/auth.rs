use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::client::AuthClient;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::{AuthUser, IdTokenResult};
use crate::reactive::{PartialObserver, Unsubscribe};

#[derive(Default)]
struct Inner {
    current: Option<AuthUser>,
    token: String,
    claims_by_uid: HashMap<String, Value>,
    listeners: Vec<(u64, PartialObserver<Option<AuthUser>>)>,
    next_id: u64,
    token_requests: usize,
    fail_next_token: Option<AuthError>,
}

/// In-memory authentication provider standing in for the real client.
///
/// Emits one combined identity+token event per sign-in, token refresh, or
/// sign-out, and delivers the current identity immediately at registration.
pub struct FakeAuth {
    inner: Arc<Mutex<Inner>>,
}

impl FakeAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        })
    }

    pub fn sign_in(&self, user: AuthUser, token: &str, claims: Value) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.claims_by_uid.insert(user.uid.clone(), claims);
            inner.token = token.to_string();
            inner.current = Some(user);
        }
        self.notify();
    }

    /// Re-issues the current user's token; the identity itself is unchanged.
    pub fn refresh_token(&self, token: &str) {
        self.inner.lock().unwrap().token = token.to_string();
        self.notify();
    }

    pub fn set_claims(&self, uid: &str, claims: Value) {
        self.inner
            .lock()
            .unwrap()
            .claims_by_uid
            .insert(uid.to_string(), claims);
    }

    pub fn fail_next_token(&self, error: AuthError) {
        self.inner.lock().unwrap().fail_next_token = Some(error);
    }

    pub fn token_requests(&self) -> usize {
        self.inner.lock().unwrap().token_requests
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().unwrap().listeners.len()
    }

    fn notify(&self) {
        let (current, observers): (Option<AuthUser>, Vec<_>) = {
            let inner = self.inner.lock().unwrap();
            (
                inner.current.clone(),
                inner
                    .listeners
                    .iter()
                    .map(|(_, observer)| observer.clone())
                    .collect(),
            )
        };
        for observer in observers {
            if let Some(next) = observer.next {
                next(&current);
            }
        }
    }
}

#[async_trait]
impl AuthClient for FakeAuth {
    fn on_id_token_changed(&self, observer: PartialObserver<Option<AuthUser>>) -> Unsubscribe {
        let (id, current) = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, observer.clone()));
            (id, inner.current.clone())
        };
        if let Some(next) = observer.next {
            next(&current);
        }

        let handle = Arc::clone(&self.inner);
        Box::new(move || {
            handle
                .lock()
                .unwrap()
                .listeners
                .retain(|(entry_id, _)| *entry_id != id);
        })
    }

    async fn get_id_token_result(
        &self,
        user: &AuthUser,
        _force_refresh: bool,
    ) -> AuthResult<IdTokenResult> {
        let mut inner = self.inner.lock().unwrap();
        inner.token_requests += 1;
        if let Some(error) = inner.fail_next_token.take() {
            return Err(error);
        }
        Ok(IdTokenResult {
            token: inner.token.clone(),
            sign_in_provider: Some(user.provider_id.clone()),
            claims: inner
                .claims_by_uid
                .get(&user.uid)
                .cloned()
                .unwrap_or(Value::Null),
            ..IdTokenResult::default()
        })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.inner.lock().unwrap().current = None;
        self.notify();
        Ok(())
    }
}
