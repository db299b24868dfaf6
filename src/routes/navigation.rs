use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Navigation Router Module
///
/// The client-side router calls this before committing each navigation, including
/// the initial load, and follows the decision it gets back.
pub fn navigation_routes() -> Router<AppState> {
    Router::new()
        // POST /api/navigation/decide
        // Body: { target, current }. Credentials come from the request itself.
        .route("/api/navigation/decide", post(handlers::decide_navigation))
}
