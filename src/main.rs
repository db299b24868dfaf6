use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use volunteer_portal::{
    AppState, FirestoreRecordStore, InMemoryRecordStore, NavigationGuard, RecordStoreState,
    RouteTable, SessionTokenVerifier,
    config::{AppConfig, Env},
    create_router,
    identity::StaticIdentityProvider,
};

/// main
///
/// Loads configuration, initializes logging, wires the record store and the guard,
/// and serves the HTTP shell.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "volunteer_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Record store: Firestore when a project is configured, in-memory otherwise.
    let records: RecordStoreState = match &config.firestore_project_id {
        Some(project_id) => {
            tracing::info!("Reading user roles from Firestore project {}", project_id);
            Arc::new(FirestoreRecordStore::new(
                &config.firestore_base_url,
                project_id,
                config.firestore_api_key.clone(),
            ))
        }
        None => {
            let store = match &config.user_records_path {
                Some(path) => {
                    let seed = std::fs::read_to_string(path)
                        .expect("FATAL: USER_RECORDS_PATH is not readable");
                    InMemoryRecordStore::from_users_json(&seed)
                        .expect("FATAL: USER_RECORDS_PATH is not a valid user seed")
                }
                None => InMemoryRecordStore::new(),
            };
            tracing::info!("Reading user roles from the in-memory store");
            Arc::new(store)
        }
    };

    // 4. Guard. Requests replace the signed-out default with their own provider.
    let guard = NavigationGuard::new(
        Arc::new(RouteTable::app()),
        Arc::new(StaticIdentityProvider::signed_out()),
        records,
    )
    .with_redirects(config.redirects.clone())
    .with_identity_timeout(config.identity_timeout);

    let app_state = AppState {
        guard,
        sessions: SessionTokenVerifier::new(config.session_secret.clone()),
        config: config.clone(),
    };

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: failed to bind BIND_ADDR");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("FATAL: server error");
}
