//! Web server setup and routing

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::api;
use crate::config::TlsConfig;
use crate::state::AppState;
use crate::ws;

/// Run the web server (HTTP or HTTPS depending on config)
pub async fn run(state: Arc<AppState>, bind: &str, tls: Option<&TlsConfig>) -> Result<()> {
    // Build router
    let app = Router::new()
        // API routes
        .route("/api/pose", get(api::get_pose).post(api::restore_pose))
        .route("/api/pose/save", post(api::save_pose))
        .route("/api/home", post(api::home))
        .route("/api/joints", get(api::list_joints))
        .route(
            "/api/publish",
            get(api::get_publish).post(api::configure_publish),
        )
        .route("/api/configs", get(api::list_configs))
        .route(
            "/api/configs/{name}",
            get(api::get_saved_config)
                .post(api::save_config)
                .delete(api::delete_config),
        )
        .route("/api/configs/{name}/apply", post(api::apply_config))
        .route("/api/export", get(api::export_pose))
        .route("/api/import", post(api::import_pose))
        .route("/api/config", get(api::get_config))
        // WebSocket bridge for commands and real-time updates
        .route("/ws", get(ws::websocket_handler))
        // Static files (control surface) - must be fallback for root
        .fallback_service(ServeDir::new(&state.config.ui.path))
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // State
        .with_state(state.clone());

    // Start server with or without TLS
    if let Some(tls_config) = tls {
        run_https(app, bind, tls_config).await
    } else {
        run_http(app, bind).await
    }
}

/// Run plain HTTP server
async fn run_http(app: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %bind, protocol = "HTTP", "Starting web server");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run HTTPS server with TLS
async fn run_https(app: Router, bind: &str, tls: &TlsConfig) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;
    use std::path::PathBuf;

    let cert_path = PathBuf::from(&tls.cert);
    let key_path = PathBuf::from(&tls.key);

    // Verify files exist
    if !cert_path.exists() {
        anyhow::bail!("TLS certificate file not found: {}", tls.cert);
    }
    if !key_path.exists() {
        anyhow::bail!("TLS key file not found: {}", tls.key);
    }

    let rustls_config = RustlsConfig::from_pem_file(&cert_path, &key_path).await?;

    let addr: std::net::SocketAddr = bind.parse()?;
    info!(address = %bind, protocol = "HTTPS", cert = %tls.cert, "Starting web server with TLS");

    axum_server::bind_rustls(addr, rustls_config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
