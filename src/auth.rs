use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use std::{convert::Infallible, sync::Arc};

use crate::{
    config::{AppConfig, Env},
    identity::{IdentityProviderState, StaticIdentityProvider},
    models::Identity,
    session::{SessionTokenVerifier, TokenIdentityProvider},
};

/// Development-only header naming the identity directly.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Cookie carrying the session token for page requests.
pub const SESSION_COOKIE: &str = "session";

/// RequestIdentity Extractor Result
///
/// The identity provider scoped to one request. Handlers hand it to the guard; it is
/// never resolved here, so an unauthenticated request is not rejected at extraction
/// time. Whether it may proceed is the guard's call.
pub struct RequestIdentity(pub IdentityProviderState);

/// RequestIdentity Extractor Implementation
///
/// 1. Local bypass: in `Env::Local`, a non-empty `x-user-id` header names the identity.
/// 2. Otherwise the session token is taken from `Authorization: Bearer` or, failing
///    that, the `session` cookie, and verified lazily when the guard subscribes.
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    SessionTokenVerifier: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            if let Some(id) = header_str(&parts.headers, USER_ID_HEADER) {
                tracing::debug!(identity = %id, "local identity bypass");
                let provider = StaticIdentityProvider::signed_in(Identity::new(id));
                return Ok(Self(Arc::new(provider)));
            }
        }

        let token = bearer_token(&parts.headers).or_else(|| session_cookie(&parts.headers));
        let verifier = SessionTokenVerifier::from_ref(state);

        Ok(Self(Arc::new(TokenIdentityProvider::new(token, verifier))))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
