use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::sync::oneshot;

use crate::{error::IdentityProviderError, models::Identity};

/// Callback bundle handed to `IdentityProvider::subscribe`.
///
/// `on_next` receives the current identity (or `None` when signed out);
/// `on_error` receives provider failures. Providers may call either one zero or more
/// times, synchronously from inside `subscribe` or later from another task.
pub struct IdentityObserver {
    on_next: Box<dyn FnMut(Option<Identity>) + Send>,
    on_error: Box<dyn FnMut(IdentityProviderError) + Send>,
}

impl IdentityObserver {
    pub fn new(
        on_next: impl FnMut(Option<Identity>) + Send + 'static,
        on_error: impl FnMut(IdentityProviderError) + Send + 'static,
    ) -> Self {
        Self {
            on_next: Box::new(on_next),
            on_error: Box::new(on_error),
        }
    }

    pub fn next(&mut self, identity: Option<Identity>) {
        (self.on_next)(identity)
    }

    pub fn error(&mut self, err: IdentityProviderError) {
        (self.on_error)(err)
    }
}

/// Subscription
///
/// Handle returned by `subscribe`. The cancel action runs exactly once: on
/// `unsubscribe()` or, failing that, on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release (providers that emit synchronously).
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

/// IdentityProvider Contract
///
/// Push-based source of the current identity. Session state may still be restoring
/// when a caller asks; there is no synchronous getter.
pub trait IdentityProvider: Send + Sync {
    fn subscribe(&self, observer: IdentityObserver) -> Subscription;
}

/// IdentityProviderState
///
/// The concrete type used to share an identity provider.
pub type IdentityProviderState = Arc<dyn IdentityProvider>;

type FirstEvent = Result<Option<Identity>, IdentityProviderError>;

/// resolve_current_identity
///
/// Subscribes, waits for the first event, releases the subscription, and yields that
/// event. Later changes are not observed. The subscription is released on success,
/// on error, and when the returned future is dropped before completion.
///
/// A provider that never emits leaves this pending; use
/// `resolve_current_identity_within` to bound it.
pub async fn resolve_current_identity(
    provider: &dyn IdentityProvider,
) -> Result<Option<Identity>, IdentityProviderError> {
    let (tx, rx) = oneshot::channel::<FirstEvent>();
    let slot = Arc::new(Mutex::new(Some(tx)));
    let error_slot = Arc::clone(&slot);

    let subscription = provider.subscribe(IdentityObserver::new(
        move |identity| deliver(&slot, Ok(identity)),
        move |err| deliver(&error_slot, Err(err)),
    ));

    let first = rx.await;
    subscription.unsubscribe();

    match first {
        Ok(event) => event,
        // The provider dropped the observer without ever emitting.
        Err(_) => Err(IdentityProviderError::new(
            "identity stream closed before its first event",
        )),
    }
}

/// resolve_current_identity_within
///
/// Same as `resolve_current_identity`, but a provider that stays silent for longer
/// than `limit` fails the resolution. Dropping the inner future releases the
/// subscription.
pub async fn resolve_current_identity_within(
    provider: &dyn IdentityProvider,
    limit: Duration,
) -> Result<Option<Identity>, IdentityProviderError> {
    match tokio::time::timeout(limit, resolve_current_identity(provider)).await {
        Ok(result) => result,
        Err(_) => Err(IdentityProviderError::new(format!(
            "identity provider did not report within {}ms",
            limit.as_millis()
        ))),
    }
}

/// Only the first call wins; later events find the slot empty.
fn deliver(slot: &Mutex<Option<oneshot::Sender<FirstEvent>>>, event: FirstEvent) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}

/// StaticIdentityProvider
///
/// Emits a fixed identity synchronously on subscribe. Used by the local development
/// bypass and as a test double.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
}

impl StaticIdentityProvider {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn subscribe(&self, mut observer: IdentityObserver) -> Subscription {
        observer.next(self.identity.clone());
        Subscription::detached()
    }
}
