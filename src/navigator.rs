use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::{guard::NavigationGuard, models::NavigationDecision, route_table::HOME_PATH};

/// Upper bound on redirect hops followed within one navigation attempt.
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// NavigationOutcome
///
/// How one `navigate` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The guard allowed `path` and it is now the current location.
    Committed { path: String },
    /// A newer attempt started before this one was decided; its result was discarded.
    Superseded,
    /// `path` has no route. The current location is unchanged.
    NotFound { path: String },
    /// Redirects kept going past the hop limit; the last requested path is reported.
    RedirectLoop { path: String },
}

/// Navigator
///
/// Hosts the guard the way a client-side router does: every call to `navigate` is a
/// numbered attempt, redirects are re-issued under the same number, and a decision
/// is only committed if its attempt is still the latest one. Stale results are
/// dropped, never applied.
pub struct Navigator {
    guard: NavigationGuard,
    current: Mutex<String>,
    latest_attempt: AtomicU64,
    max_redirects: usize,
}

impl Navigator {
    /// Starts at `/`, before the initial load has been guarded.
    pub fn new(guard: NavigationGuard) -> Self {
        Self {
            guard,
            current: Mutex::new(HOME_PATH.to_string()),
            latest_attempt: AtomicU64::new(0),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn current_path(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn navigate(&self, target: &str) -> NavigationOutcome {
        let attempt = self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let mut requested = target.to_string();

        for _ in 0..=self.max_redirects {
            let from = self.current_path();
            let decision = self.guard.decide(&requested, &from).await;

            if !self.is_latest(attempt) {
                tracing::debug!(attempt, to = %requested, "navigation superseded, discarding");
                return NavigationOutcome::Superseded;
            }

            match decision {
                Err(not_found) => {
                    tracing::debug!(attempt, "{}", not_found);
                    return NavigationOutcome::NotFound {
                        path: not_found.path,
                    };
                }
                Ok(NavigationDecision::RedirectTo { path }) => {
                    tracing::debug!(attempt, from = %requested, to = %path, "redirected");
                    requested = path;
                }
                Ok(NavigationDecision::Proceed) => {
                    let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
                    // Re-checked under the lock so a commit never overtakes a newer one.
                    if !self.is_latest(attempt) {
                        return NavigationOutcome::Superseded;
                    }
                    *current = requested.clone();
                    tracing::debug!(attempt, path = %requested, "navigation committed");
                    return NavigationOutcome::Committed { path: requested };
                }
            }
        }

        tracing::warn!(attempt, path = %requested, "redirect limit reached");
        NavigationOutcome::RedirectLoop { path: requested }
    }

    fn is_latest(&self, attempt: u64) -> bool {
        self.latest_attempt.load(Ordering::SeqCst) == attempt
    }
}
