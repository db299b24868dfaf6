use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::sync::watch;

use crate::{
    error::{IdentityProviderError, SessionError},
    identity::{IdentityObserver, IdentityProvider, Subscription},
    models::Identity,
};

/// Claims
///
/// Payload of a session token. `sub` is the identity id, which is also the key of
/// the user's record in the `users` collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// SessionTokenVerifier
///
/// Validates HS256 session tokens against the configured secret. Expiry is always
/// enforced, with no leeway.
#[derive(Clone)]
pub struct SessionTokenVerifier {
    secret: String,
}

impl SessionTokenVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::Misconfigured("empty signing secret".to_string()));
        }

        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &key, &validation) {
            Ok(data) => Ok(Identity::new(data.claims.sub)),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(SessionError::Expired),
                _ => Err(SessionError::Invalid(e.to_string())),
            },
        }
    }

    /// issue
    ///
    /// Signs a token for `identity` valid for `ttl`. Used by local tooling and tests;
    /// production tokens come from the identity provider.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, SessionError> {
        if self.secret.is_empty() {
            return Err(SessionError::Misconfigured("empty signing secret".to_string()));
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SessionError::Misconfigured(e.to_string()))?
            .as_secs();

        let claims = Claims {
            sub: identity.id.clone(),
            iat: now as usize,
            exp: (now + ttl.as_secs()) as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SessionError::Invalid(e.to_string()))
    }
}

/// TokenIdentityProvider
///
/// Per-request provider built from the credentials a request carries. It emits
/// synchronously on subscribe:
/// - no token, or an expired or invalid one: signed out (`None`);
/// - a verifier that cannot work at all: an error.
pub struct TokenIdentityProvider {
    token: Option<String>,
    verifier: SessionTokenVerifier,
}

impl TokenIdentityProvider {
    pub fn new(token: Option<String>, verifier: SessionTokenVerifier) -> Self {
        Self { token, verifier }
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn subscribe(&self, mut observer: IdentityObserver) -> Subscription {
        let Some(token) = self.token.as_deref() else {
            observer.next(None);
            return Subscription::detached();
        };

        match self.verifier.verify(token) {
            Ok(identity) => observer.next(Some(identity)),
            Err(SessionError::Misconfigured(reason)) => {
                observer.error(IdentityProviderError::new(reason))
            }
            Err(e) => {
                tracing::debug!("session token not accepted: {}", e);
                observer.next(None)
            }
        }
        Subscription::detached()
    }
}

/// SessionState
///
/// Lifecycle of a long-lived session. `Restoring` is the window after start-up
/// where persisted credentials have not been checked yet; nothing is emitted in it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Restoring,
    SignedIn(Identity),
    SignedOut,
    Failed(String),
}

/// SessionIdentityProvider
///
/// Long-lived provider backed by a `watch` channel. Every subscription spawns a
/// watcher task (so `subscribe` must be called inside a Tokio runtime) that emits
/// the first settled state and each change after it.
pub struct SessionIdentityProvider {
    state: watch::Sender<SessionState>,
    active: Arc<AtomicUsize>,
}

impl Default for SessionIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentityProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Restoring);
        Self {
            state,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        self.set(SessionState::SignedIn(identity));
    }

    pub fn sign_out(&self) {
        self.set(SessionState::SignedOut);
    }

    pub fn fail(&self, reason: impl Into<String>) {
        self.set(SessionState::Failed(reason.into()));
    }

    /// Settles a restoring session from a persisted token.
    pub fn restore_from_token(&self, token: &str, verifier: &SessionTokenVerifier) {
        match verifier.verify(token) {
            Ok(identity) => self.sign_in(identity),
            Err(SessionError::Misconfigured(reason)) => self.fail(reason),
            Err(e) => {
                tracing::debug!("persisted session discarded: {}", e);
                self.sign_out()
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Number of subscriptions not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn set(&self, next: SessionState) {
        self.state.send_replace(next);
    }
}

impl IdentityProvider for SessionIdentityProvider {
    fn subscribe(&self, mut observer: IdentityObserver) -> Subscription {
        let mut rx = self.state.subscribe();
        self.active.fetch_add(1, Ordering::SeqCst);

        let watcher = tokio::spawn(async move {
            loop {
                let state = rx.borrow_and_update().clone();
                match state {
                    SessionState::Restoring => {}
                    SessionState::SignedIn(identity) => observer.next(Some(identity)),
                    SessionState::SignedOut => observer.next(None),
                    SessionState::Failed(reason) => {
                        observer.error(IdentityProviderError::new(reason))
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        let active = Arc::clone(&self.active);
        Subscription::new(move || {
            watcher.abort();
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}
