//! worker-monitor gateway entry point.
//!
//! Starts the Axum HTTP server with the WebSocket endpoint, the bus ingest
//! and connection endpoints, and the bus dispatcher.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use worker_monitor::api;
use worker_monitor::app_state::AppState;
use worker_monitor::config::GatewayConfig;
use worker_monitor::domain::{EventBus, EventRule};
use worker_monitor::registry::{ConnectionRegistry, MemoryRegistry, PostgresRegistry};
use worker_monitor::service::{Broadcaster, Dispatcher, LifecycleService};
use worker_monitor::transport::{ConnectionHub, ManagementClient, Transport};
use worker_monitor::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting worker-monitor");

    // Connection registry
    let registry: Arc<dyn ConnectionRegistry> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        let registry = PostgresRegistry::new(pool, &config.table_name)?;
        registry.ensure_schema().await?;
        tracing::info!(table = %config.table_name, "using PostgreSQL connection registry");
        Arc::new(registry)
    } else {
        tracing::info!("persistence disabled, using in-memory connection registry");
        Arc::new(MemoryRegistry::new())
    };

    // Transport
    let hub = Arc::new(ConnectionHub::new());
    let transport: Arc<dyn Transport> = match &config.transport_endpoint {
        Some(endpoint) => {
            tracing::info!(%endpoint, "delivering through external management endpoint");
            Arc::new(ManagementClient::new(endpoint, config.transport_timeout)?)
        }
        None => {
            if config.persistence_enabled {
                tracing::warn!(
                    instance = %hub.instance(),
                    "registry may be shared; only sessions issued here are pruned"
                );
            }
            Arc::clone(&hub) as Arc<dyn Transport>
        }
    };

    // Event pipeline
    let event_bus = EventBus::new(config.event_bus_name.as_str(), config.event_bus_capacity);
    let broadcaster = Broadcaster::new(Arc::clone(&registry), transport);
    let rule = EventRule::status_updates(config.event_source.as_str());
    let _dispatcher = Dispatcher::new(rule, broadcaster).spawn(&event_bus);
    tracing::info!(
        bus = %config.event_bus_name,
        source = %config.event_source,
        "dispatcher subscribed to event bus"
    );

    // Build application state
    let app_state = AppState {
        lifecycle: LifecycleService::new(registry),
        event_bus,
        hub,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
