use thiserror::Error;

/// IdentityProviderError
///
/// The identity subscription reported a failure (misconfigured provider, stream closed
/// before the first event, or a resolution that exceeded its time bound).
/// The guard treats this exactly like an absent identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity provider error: {0}")]
pub struct IdentityProviderError(pub String);

impl IdentityProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// RoleStoreError
///
/// A record lookup against the external store failed. The guard fails closed on
/// both variants (role mismatch, redirect home).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleStoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// RouteNotFound
///
/// The navigation target matched no Route Table entry. Handed back to the routing
/// framework untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no route matches '{path}'")]
pub struct RouteNotFound {
    pub path: String,
}

/// RouteTableError
///
/// Rejected route definitions at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route path '{0}' must start with '/'")]
    InvalidPath(String),
}

/// SessionError
///
/// Failures while verifying or issuing session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session token expired")]
    Expired,

    #[error("session token rejected: {0}")]
    Invalid(String),

    #[error("session verifier misconfigured: {0}")]
    Misconfigured(String),
}

/// ConfigError
///
/// Fail-fast configuration errors raised by `AppConfig::load`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}
