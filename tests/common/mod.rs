#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use volunteer_portal::{
    InMemoryRecordStore, NavigationGuard, RouteTable,
    error::{IdentityProviderError, RoleStoreError},
    identity::{IdentityObserver, IdentityProvider, Subscription},
    models::{Identity, Role},
    records::{Record, RecordStore},
};

// --- Identity Provider Test Double ---

/// What the double does when subscribed to.
#[derive(Clone)]
pub enum Emission {
    /// Emits synchronously inside `subscribe`.
    Now(Option<Identity>),
    /// Emits both values synchronously, in order.
    Twice(Option<Identity>, Option<Identity>),
    /// Reports an error synchronously.
    Fail(String),
    /// Never emits; the observer is kept alive until the subscription is released.
    Silent,
}

/// Identity provider that counts live subscriptions.
pub struct CountingIdentityProvider {
    emission: Emission,
    active: Arc<AtomicUsize>,
    subscribes: AtomicUsize,
}

impl CountingIdentityProvider {
    pub fn new(emission: Emission) -> Self {
        Self {
            emission,
            active: Arc::new(AtomicUsize::new(0)),
            subscribes: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(id: &str) -> Self {
        Self::new(Emission::Now(Some(Identity::new(id))))
    }

    pub fn signed_out() -> Self {
        Self::new(Emission::Now(None))
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for CountingIdentityProvider {
    fn subscribe(&self, mut observer: IdentityObserver) -> Subscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.subscribes.fetch_add(1, Ordering::SeqCst);

        let mut retained = None;
        match self.emission.clone() {
            Emission::Now(identity) => observer.next(identity),
            Emission::Twice(first, second) => {
                observer.next(first);
                observer.next(second);
            }
            Emission::Fail(reason) => observer.error(IdentityProviderError::new(reason)),
            Emission::Silent => retained = Some(observer),
        }

        let active = Arc::clone(&self.active);
        Subscription::new(move || {
            drop(retained);
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

// --- Record Store Test Double ---

/// Wraps an in-memory store and counts lookups.
pub struct CountingRecordStore {
    inner: InMemoryRecordStore,
    lookups: AtomicUsize,
}

impl CountingRecordStore {
    pub fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingRecordStore {
    async fn get_record(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Record>, RoleStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_record(collection, key).await
    }
}

// --- Fixtures ---

/// u1: volunteer, u3: elder, u4: admin. u2 has no record.
pub fn seeded_store() -> InMemoryRecordStore {
    InMemoryRecordStore::new()
        .with_user_role("u1", Role::Volunteer)
        .with_user_role("u3", Role::Elder)
        .with_user_role("u4", Role::Admin)
}

pub fn guard_with(
    identity: Arc<dyn IdentityProvider>,
    records: Arc<dyn RecordStore>,
) -> NavigationGuard {
    NavigationGuard::new(Arc::new(RouteTable::app()), identity, records)
}
