//! HTTP server bootstrap for Policyflow.
//!
//! Wires together configuration, the database pool, core services
//! (lifecycle, notification deriver, risk model, verifier), and the Axum
//! router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::infra::{ApplicationStore, AuditLog, MemoryStore, PgStore, WatermarkStore};
use crate::lifecycle::Lifecycle;
use crate::notify::NotificationDeriver;
use crate::risk::{RiskModel, StandardRiskModel};
use crate::verification::{HeuristicVerifier, Verifier};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/policyflow".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .expect("Invalid listen address");

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        Self {
            database_url,
            listen_addr,
            max_connections,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<Lifecycle>,
    pub applications: Arc<dyn ApplicationStore>,
    pub audit: Arc<dyn AuditLog>,
    pub notifications: Arc<NotificationDeriver>,
    pub risk: Arc<dyn RiskModel>,
    pub verifier: Arc<dyn Verifier>,
}

impl AppState {
    /// Wire the full service graph over one storage backend.
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        audit: Arc<dyn AuditLog>,
        watermarks: Arc<dyn WatermarkStore>,
        risk: Arc<dyn RiskModel>,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        let lifecycle = Arc::new(Lifecycle::new(applications.clone()));
        let notifications = Arc::new(NotificationDeriver::new(
            audit.clone(),
            applications.clone(),
            watermarks,
        ));
        Self {
            lifecycle,
            applications,
            audit,
            notifications,
            risk,
            verifier,
        }
    }

    /// In-memory state for tests and local development.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(StandardRiskModel::new()),
            Arc::new(HeuristicVerifier::new()),
        )
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Policyflow v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to PostgreSQL");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run_postgres(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    let store = Arc::new(PgStore::new(pool));
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(StandardRiskModel::new()),
        Arc::new(HeuristicVerifier::new()),
    );

    let app = build_router()?.with_state(state);

    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Policyflow is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Build the full application router (API + health probes).
pub fn build_router() -> anyhow::Result<Router<AppState>> {
    let mut router = Router::new()
        .nest("/api", crate::api::router())
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "policyflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint; verifies storage connectivity.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    match state.applications.count().await {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "storage": "connected",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Storage unavailable: {}", e),
        )),
    }
}
