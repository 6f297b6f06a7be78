pub mod batch;
pub mod config;
pub mod handlers;
pub mod models;
pub mod processor;
pub mod report;
pub mod workers;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::api::batch::BatchDetector;
use crate::api::config::DetectorConfig;
use crate::api::handlers::{detect_csv_handler, detect_handler, health_check, StartedAt};

/// Registers the detection and health routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/scrape")
            .route("", web::post().to(detect_handler))
            .route("/csv", web::post().to(detect_csv_handler)),
    )
    .service(web::resource("/health").route(web::get().to(health_check)));
}

/// Starts the API server with the specified configuration
///
/// Builds the HTTP client and worker pool once, then shares them with every
/// server worker.
#[instrument(skip(config))]
pub async fn start_server(host: &str, port: u16, config: DetectorConfig) -> Result<()> {
    info!("Starting platform detection server on {}:{}", host, port);
    config.validate()?;

    let detector = BatchDetector::new(&config).context("Failed to initialize detector")?;
    let detector_data = web::Data::new(detector);
    let started_at = web::Data::new(StartedAt(Instant::now()));

    HttpServer::new(move || {
        App::new()
            .app_data(detector_data.clone())
            .app_data(started_at.clone())
            .configure(routes)
    })
    .bind((host, port))
    .map_err(|e| {
        error!("Failed to bind to {}:{}: {}", host, port, e);
        e
    })?
    .run()
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
