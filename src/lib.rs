use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authorization core: route catalogue, identity and role resolution, the guard.
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod navigator;
pub mod records;
pub mod roles;
pub mod route_table;
pub mod session;

// HTTP shell.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod routes;
use routes::{navigation, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::NavigationGuard;
pub use navigator::{NavigationOutcome, Navigator};
pub use records::{FirestoreRecordStore, InMemoryRecordStore, RecordStoreState};
pub use route_table::RouteTable;
pub use session::SessionTokenVerifier;

/// ApiDoc
///
/// OpenAPI description of the HTTP shell, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_routes, handlers::decide_navigation),
    components(
        schemas(
            models::Role, models::AuthRequirement, models::NavigationDecision,
            models::RouteSummary, models::DecideRequest, models::PageDescriptor,
        )
    ),
    tags(
        (name = "volunteer-portal", description = "Volunteer Portal navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply cloneable state. The guard carries the Route Table and the record
/// store; request handlers swap in a per-request identity provider.
#[derive(Clone)]
pub struct AppState {
    pub guard: NavigationGuard,
    pub sessions: SessionTokenVerifier,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for NavigationGuard {
    fn from_ref(app_state: &AppState) -> NavigationGuard {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for SessionTokenVerifier {
    fn from_ref(app_state: &AppState) -> SessionTokenVerifier {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the API routes, the guarded page shell fallback, and the observability
/// layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(navigation::navigation_routes())
        // Everything else is a page request and goes through the guard.
        .fallback(handlers::serve_page)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
