use std::{sync::Arc, time::Duration};

use crate::{
    error::{IdentityProviderError, RouteNotFound},
    identity::{self, IdentityProviderState},
    models::{AuthRequirement, Identity, NavigationDecision},
    records::RecordStoreState,
    roles,
    route_table::{HOME_PATH, LOGIN_PATH, RouteTable},
};

/// RedirectTargets
///
/// Where denied navigations are sent: unauthenticated ones to `login`, authenticated
/// ones lacking the required role to `home`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub login: String,
    pub home: String,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            login: LOGIN_PATH.to_string(),
            home: HOME_PATH.to_string(),
        }
    }
}

/// NavigationGuard
///
/// The decision function run before every navigation commit, including the initial
/// load. Holds no state between calls: identity and role are queried fresh from the
/// collaborators each time.
#[derive(Clone)]
pub struct NavigationGuard {
    routes: Arc<RouteTable>,
    identity: IdentityProviderState,
    records: RecordStoreState,
    redirects: RedirectTargets,
    identity_timeout: Option<Duration>,
}

impl NavigationGuard {
    pub fn new(
        routes: Arc<RouteTable>,
        identity: IdentityProviderState,
        records: RecordStoreState,
    ) -> Self {
        Self {
            routes,
            identity,
            records,
            redirects: RedirectTargets::default(),
            identity_timeout: None,
        }
    }

    pub fn with_redirects(mut self, redirects: RedirectTargets) -> Self {
        self.redirects = redirects;
        self
    }

    /// Bounds identity resolution. `None` waits for the provider indefinitely.
    pub fn with_identity_timeout(mut self, limit: Option<Duration>) -> Self {
        self.identity_timeout = limit;
        self
    }

    /// Same guard, different identity source. Used to scope a guard to one request.
    pub fn with_identity(&self, identity: IdentityProviderState) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn redirects(&self) -> &RedirectTargets {
        &self.redirects
    }

    /// decide
    ///
    /// 1. Unrestricted routes proceed without touching any collaborator.
    /// 2. No identity (or a provider failure) redirects to login.
    /// 3. Authentication-only routes then proceed.
    /// 4. Role-gated routes proceed only on an exact role match; an absent role or a
    ///    store failure redirects home.
    ///
    /// The only error is `RouteNotFound`, which belongs to the routing framework.
    pub async fn decide(
        &self,
        target: &str,
        current: &str,
    ) -> Result<NavigationDecision, RouteNotFound> {
        let route = self.routes.lookup(target)?;

        let required_role = match route.requirement {
            AuthRequirement::None => {
                tracing::debug!(to = %target, from = %current, "unrestricted route, proceeding");
                return Ok(NavigationDecision::Proceed);
            }
            AuthRequirement::Authenticated => None,
            AuthRequirement::AuthenticatedWithRole(role) => Some(role),
        };

        let identity = match self.resolve_identity().await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::debug!(to = %target, from = %current, "no identity, redirecting to login");
                return Ok(NavigationDecision::redirect(&self.redirects.login));
            }
            Err(e) => {
                tracing::warn!(to = %target, "identity resolution failed, treating as signed out: {}", e);
                return Ok(NavigationDecision::redirect(&self.redirects.login));
            }
        };

        let Some(required) = required_role else {
            tracing::debug!(to = %target, identity = %identity.id, "authenticated, proceeding");
            return Ok(NavigationDecision::Proceed);
        };

        match roles::resolve_role(self.records.as_ref(), &identity).await {
            Ok(Some(role)) if role == required => {
                tracing::debug!(to = %target, identity = %identity.id, %role, "role matched, proceeding");
                Ok(NavigationDecision::Proceed)
            }
            Ok(role) => {
                tracing::debug!(
                    to = %target,
                    identity = %identity.id,
                    required = %required,
                    actual = ?role,
                    "role mismatch, redirecting home"
                );
                Ok(NavigationDecision::redirect(&self.redirects.home))
            }
            Err(e) => {
                tracing::warn!(to = %target, identity = %identity.id, "role lookup failed, denying: {}", e);
                Ok(NavigationDecision::redirect(&self.redirects.home))
            }
        }
    }

    async fn resolve_identity(&self) -> Result<Option<Identity>, IdentityProviderError> {
        let provider = self.identity.as_ref();
        match self.identity_timeout {
            Some(limit) => identity::resolve_current_identity_within(provider, limit).await,
            None => identity::resolve_current_identity(provider).await,
        }
    }
}
