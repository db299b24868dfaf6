use std::{env, time::Duration};

use crate::{
    error::ConfigError,
    guard::RedirectTargets,
    navigator::DEFAULT_MAX_REDIRECTS,
    records::FIRESTORE_BASE_URL,
};

const LOCAL_SESSION_SECRET: &str = "local-session-secret-not-for-production";

/// AppConfig
///
/// The application's configuration, immutable once loaded and pulled into handlers
/// through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the `x-user-id` development bypass.
    pub env: Env,
    // Socket address the HTTP shell binds to.
    pub bind_addr: String,
    // HS256 secret used to verify session tokens.
    pub session_secret: String,
    // Firestore project holding the `users` collection. `None` selects the in-memory store.
    pub firestore_project_id: Option<String>,
    pub firestore_base_url: String,
    pub firestore_api_key: Option<String>,
    // Optional JSON seed for the in-memory store (local only).
    pub user_records_path: Option<String>,
    // Where denied navigations go.
    pub redirects: RedirectTargets,
    // Bound on identity resolution; `None` waits indefinitely.
    pub identity_timeout: Option<Duration>,
    pub max_redirects: usize,
}

/// Env
///
/// Runtime context. `Local` enables development conveniences; `Production` demands
/// every secret explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe values for tests: local mode, in-memory store, no timeout.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            firestore_project_id: None,
            firestore_base_url: FIRESTORE_BASE_URL.to_string(),
            firestore_api_key: None,
            user_records_path: None,
            redirects: RedirectTargets::default(),
            identity_timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment. Fails fast when production is
    /// missing `SESSION_JWT_SECRET` or `FIRESTORE_PROJECT_ID`, or when a numeric
    /// variable does not parse.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => {
                env::var("SESSION_JWT_SECRET").map_err(|_| ConfigError::Missing("SESSION_JWT_SECRET"))?
            }
            Env::Local => env::var("SESSION_JWT_SECRET")
                .unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
        };

        let firestore_project_id = optional("FIRESTORE_PROJECT_ID");
        if env == Env::Production && firestore_project_id.is_none() {
            return Err(ConfigError::Missing("FIRESTORE_PROJECT_ID"));
        }

        let defaults = Self::default();

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_secret,
            firestore_project_id,
            firestore_base_url: optional("FIRESTORE_BASE_URL")
                .unwrap_or(defaults.firestore_base_url),
            firestore_api_key: optional("FIRESTORE_API_KEY"),
            // The seed file is a development convenience only.
            user_records_path: match env {
                Env::Local => optional("USER_RECORDS_PATH"),
                Env::Production => None,
            },
            redirects: defaults.redirects,
            identity_timeout: parsed::<u64>("IDENTITY_TIMEOUT_MS")?.map(Duration::from_millis),
            max_redirects: parsed::<usize>("MAX_REDIRECTS")?.unwrap_or(defaults.max_redirects),
            env,
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional(var)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}
