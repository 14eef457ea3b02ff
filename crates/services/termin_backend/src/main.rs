// File: services/termin_backend/src/main.rs
use std::net::SocketAddr;
use termin_backend::{app::build_app, service_factory::create_booking_service};
use termin_common::logging;
use termin_config::load_config;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    // Dropping the guard stops the file writer, so it lives as long as main.
    let _log_guard = logging::init_from_config(config.logging.as_ref());

    let service = create_booking_service(&config).await.map_err(|err| {
        logging::log_error(&err, "Failed to initialize booking service");
        err
    })?;
    let app = build_app(service, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
