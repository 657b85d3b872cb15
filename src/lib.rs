//! Documentation of the community data dashboard backend.
//!
//!
//!
//! # General Infrastructure
//! - Single backend process serving the static dashboard and its data API
//! - Three collections in MongoDB, populated by a separate ingestion job
//! - This process never writes; every endpoint is a read-only query
//! - Frontend fetches `/data/*` and renders tables client side
//!
//!
//!
//! # Notes
//!
//! ## MongoDB
//! The three collections are schema-less by design: the ingestion job loads
//! whatever columns the source spreadsheets carry. The backend therefore
//! works on raw BSON documents and only interprets the two identifier fields
//! and the location field needed for the community join. Everything else is
//! passed through to the frontend untouched.
//!
//! Both collections of the community join are loaded fully into memory per
//! request. Collection sizes are in the hundreds, so this is acceptable;
//! it would need a server-side `$lookup` before it scales past that.
//!
//! ## Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;

use routes::{community_handler, housing_handler, volunteers_handler};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let index = ServeFile::new(state.config.static_dir.join("index.html"));
    let assets = ServeDir::new(&state.config.static_dir);

    let app = Router::new()
        .route("/data/housing", get(housing_handler))
        .route("/data/volunteers", get(volunteers_handler))
        .route("/data/community", get(community_handler))
        .route_service("/", index)
        .nest_service("/static", assets)
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
