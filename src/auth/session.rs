use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::auth::client::AuthClient;
use crate::auth::cookie::CookieStore;
use crate::auth::model::{users_equal, AuthUser};
use crate::reactive::{ObserverSet, PartialObserver, SharedSpawner, Unsubscribe};

/// Session binding configuration.
#[derive(Clone, Debug)]
pub struct AuthSessionOptions {
    /// Mirror the current ID token into a cookie on every token refresh and
    /// delete it on sign-out. When enabled, cookie presence also
    /// participates in [`signed_in`].
    ///
    /// [`signed_in`]: AuthSession::signed_in
    pub with_cookie: bool,
    pub cookie_key_name: String,
    pub cookie_path: String,
}

impl Default for AuthSessionOptions {
    fn default() -> Self {
        Self {
            with_cookie: false,
            cookie_key_name: "__session".to_string(),
            cookie_path: "/".to_string(),
        }
    }
}

/// What the binding knows about the current token's claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenClaims {
    /// No token event has settled yet.
    Unknown,
    /// The provider reported no signed-in user.
    SignedOut,
    /// Custom claims of the current ID token.
    Claims(Value),
}

impl TokenClaims {
    pub fn value(&self) -> Option<&Value> {
        match self {
            TokenClaims::Claims(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Compares claim payloads by canonical serialized form, so a re-issued
/// token with identical claims never looks like a change.
fn claims_equal(left: &TokenClaims, right: &TokenClaims) -> bool {
    match (left, right) {
        (TokenClaims::Claims(a), TokenClaims::Claims(b)) => {
            serde_json::to_string(a).unwrap_or_default()
                == serde_json::to_string(b).unwrap_or_default()
        }
        (TokenClaims::Unknown, TokenClaims::Unknown) => true,
        (TokenClaims::SignedOut, TokenClaims::SignedOut) => true,
        _ => false,
    }
}

struct SessionState {
    user: Option<AuthUser>,
    claims: TokenClaims,
    loading: Option<bool>,
    has_cookie: Option<bool>,
}

/// Live view of the authentication session.
///
/// Holds a single subscription to the client's combined identity+token
/// stream for its whole lifetime. Each event marks the session loading,
/// swaps the stored identity only when it actually changed, resolves the
/// token's claims with a forced refresh, and settles. `signed_in` is always
/// derived from the stored state, never stored itself.
pub struct AuthSession<A: AuthClient> {
    client: Arc<A>,
    spawner: SharedSpawner,
    options: AuthSessionOptions,
    state: Arc<Mutex<SessionState>>,
    epoch: Arc<AtomicU64>,
    observers: ObserverSet<()>,
    unsubscribe: Option<Unsubscribe>,
}

impl<A: AuthClient> AuthSession<A> {
    /// Opens the identity+token subscription and starts tracking the
    /// session.
    pub fn bind(
        client: Arc<A>,
        spawner: SharedSpawner,
        cookies: Arc<dyn CookieStore>,
        options: AuthSessionOptions,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            user: None,
            claims: TokenClaims::Unknown,
            loading: None,
            has_cookie: options
                .with_cookie
                .then(|| cookies.get(&options.cookie_key_name).is_some()),
        }));
        let epoch = Arc::new(AtomicU64::new(0));
        let observers = ObserverSet::new();

        let unsubscribe = {
            let state = Arc::clone(&state);
            let epoch = Arc::clone(&epoch);
            let observers = observers.clone();
            let client = Arc::clone(&client);
            let spawner = Arc::clone(&spawner);
            let cookies = Arc::clone(&cookies);
            let options = options.clone();

            Arc::clone(&client).on_id_token_changed(PartialObserver::new().with_next(
                move |user: &Option<AuthUser>| {
                    // Each event supersedes any claims fetch still in flight.
                    let token = epoch.fetch_add(1, Ordering::SeqCst) + 1;
                    {
                        let mut session = state.lock().unwrap();
                        session.loading = Some(true);
                        if !users_equal(session.user.as_ref(), user.as_ref()) {
                            session.user = user.clone();
                        }
                    }
                    observers.notify(&());

                    match user {
                        None => {
                            if options.with_cookie {
                                cookies.delete(&options.cookie_key_name, &options.cookie_path);
                            }
                            {
                                let mut session = state.lock().unwrap();
                                session.claims = TokenClaims::SignedOut;
                                session.has_cookie = options
                                    .with_cookie
                                    .then(|| cookies.get(&options.cookie_key_name).is_some());
                                session.loading = Some(false);
                            }
                            observers.notify(&());
                        }
                        Some(user) => {
                            let user = user.clone();
                            let client = Arc::clone(&client);
                            let state = Arc::clone(&state);
                            let observers = observers.clone();
                            let epoch = Arc::clone(&epoch);
                            let cookies = Arc::clone(&cookies);
                            let options = options.clone();

                            spawner.spawn(Box::pin(async move {
                                let result = client.get_id_token_result(&user, true).await;
                                if epoch.load(Ordering::SeqCst) != token {
                                    return;
                                }
                                match result {
                                    Ok(refreshed) => {
                                        if options.with_cookie {
                                            cookies.set(
                                                &options.cookie_key_name,
                                                &refreshed.token,
                                                &options.cookie_path,
                                            );
                                        }
                                        {
                                            let mut session = state.lock().unwrap();
                                            let incoming = TokenClaims::Claims(refreshed.claims);
                                            if !claims_equal(&session.claims, &incoming) {
                                                session.claims = incoming;
                                            }
                                            session.has_cookie = options.with_cookie.then(|| {
                                                cookies.get(&options.cookie_key_name).is_some()
                                            });
                                            session.loading = Some(false);
                                        }
                                        observers.notify(&());
                                    }
                                    Err(error) => {
                                        state.lock().unwrap().loading = Some(false);
                                        if !observers.notify_error(&error) {
                                            log::error!("id token refresh failed: {error}");
                                        }
                                        observers.notify(&());
                                    }
                                }
                            }));
                        }
                    }
                },
            ))
        };

        Self {
            client,
            spawner,
            options,
            state,
            epoch,
            observers,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Signs the current user out through the client; the resulting
    /// sign-out event flows back in through the subscription.
    pub fn sign_out(&self) {
        let client = Arc::clone(&self.client);
        let observers = self.observers.clone();
        self.spawner.spawn(Box::pin(async move {
            if let Err(error) = client.sign_out().await {
                if !observers.notify_error(&error) {
                    log::error!("sign out failed: {error}");
                }
            }
        }));
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.lock().unwrap().user.clone()
    }

    pub fn claims(&self) -> TokenClaims {
        self.state.lock().unwrap().claims.clone()
    }

    pub fn loading(&self) -> Option<bool> {
        self.state.lock().unwrap().loading
    }

    /// `None` while loading or while claims are unknown; otherwise claim
    /// presence, additionally gated on cookie presence when mirroring is
    /// enabled.
    pub fn signed_in(&self) -> Option<bool> {
        let session = self.state.lock().unwrap();
        if session.loading == Some(true) {
            return None;
        }
        match &session.claims {
            TokenClaims::Unknown => None,
            TokenClaims::SignedOut => Some(false),
            TokenClaims::Claims(_) => {
                if self.options.with_cookie {
                    Some(session.has_cookie == Some(true))
                } else {
                    Some(true)
                }
            }
        }
    }

    /// Presence of the mirrored session cookie; `None` when mirroring is
    /// disabled.
    pub fn has_cookie(&self) -> Option<bool> {
        self.state.lock().unwrap().has_cookie
    }

    pub fn subscribe(&self, observer: PartialObserver<()>) -> Unsubscribe {
        self.observers.subscribe(observer)
    }
}

impl<A: AuthClient> Drop for AuthSession<A> {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
        self.observers.notify_complete();
    }
}
