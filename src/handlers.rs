use crate::{
    auth::RequestIdentity,
    guard::NavigationGuard,
    models::{DecideRequest, NavigationDecision, RouteSummary},
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
};

// --- API Handlers ---

/// list_routes
///
/// [Public Route] The page catalogue with each entry's authorization requirement,
/// in match order.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route catalogue", body = [RouteSummary]))
)]
pub async fn list_routes(State(guard): State<NavigationGuard>) -> Json<Vec<RouteSummary>> {
    Json(guard.routes().summaries())
}

/// decide_navigation
///
/// [Public Route] Runs the guard for a client-side navigation from `current` to
/// `target`, using whatever credentials the request carries. The client follows
/// the returned decision.
#[utoipa::path(
    post,
    path = "/api/navigation/decide",
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Decision", body = NavigationDecision),
        (status = 404, description = "No route matches the target")
    )
)]
pub async fn decide_navigation(
    RequestIdentity(identity): RequestIdentity,
    State(guard): State<NavigationGuard>,
    Json(payload): Json<DecideRequest>,
) -> Result<Json<NavigationDecision>, StatusCode> {
    guard
        .with_identity(identity)
        .decide(&payload.target, &payload.current)
        .await
        .map(Json)
        .map_err(|not_found| {
            tracing::debug!("{}", not_found);
            StatusCode::NOT_FOUND
        })
}

// --- Page Shell ---

/// serve_page
///
/// Fallback for every path not claimed by the API. A `GET` for a catalogued page is
/// guarded: allowed pages return their descriptor, denied ones a 303 to the
/// redirect target. The navigation's origin is taken from `Referer` when present.
pub async fn serve_page(
    RequestIdentity(identity): RequestIdentity,
    State(guard): State<NavigationGuard>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let target = uri.path();
    let current = referer_path(&headers).unwrap_or_else(|| guard.redirects().home.clone());

    let guard = guard.with_identity(identity);
    match guard.decide(target, &current).await {
        Ok(NavigationDecision::Proceed) => match guard.routes().lookup(target) {
            Ok(route) => Json(route.page()).into_response(),
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        },
        Ok(NavigationDecision::RedirectTo { path }) => Redirect::to(&path).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn referer_path(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .map(|uri| uri.path().to_string())
}
