use actix_web::{http::header, web, HttpResponse, Responder};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::api::batch::BatchDetector;
use crate::api::models::{BatchDetectRequest, ErrorResponse, HealthStatus};

/// Process start time, shared with the health endpoint
#[derive(Debug, Clone, Copy)]
pub struct StartedAt(pub Instant);

/// HTTP handler for JSON batch detection
///
/// Always answers 200 with one result per input URL, in input order.
/// Individual URL failures are reported inside the results.
#[instrument(skip(request, detector))]
pub async fn detect_handler(
    request: web::Json<BatchDetectRequest>,
    detector: web::Data<BatchDetector>,
) -> impl Responder {
    let urls = request.into_inner().into_urls();
    info!("Received detection request for {} URL(s)", urls.len());

    let results = detector.detect_urls(&urls).await;
    HttpResponse::Ok().json(results)
}

/// HTTP handler for CSV batch detection
#[instrument(skip(request, detector))]
pub async fn detect_csv_handler(
    request: web::Json<BatchDetectRequest>,
    detector: web::Data<BatchDetector>,
) -> impl Responder {
    let urls = request.into_inner().into_urls();
    info!("Received CSV detection request for {} URL(s)", urls.len());

    match detector.detect_urls_csv(&urls).await {
        Ok(csv) => HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, "text/csv; charset=utf-8"))
            .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=\"detections.csv\""))
            .body(csv),
        Err(e) => {
            error!("Failed to render CSV: {:#}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                status: "error".to_string(),
                message: format!("Failed to render CSV: {}", e),
            })
        }
    }
}

/// Health check endpoint for monitoring service status
///
/// Reports `degraded` while the job queue is full.
#[instrument(skip(detector, started_at))]
pub async fn health_check(
    detector: web::Data<BatchDetector>,
    started_at: web::Data<StartedAt>,
) -> impl Responder {
    debug!("Processing health check request");

    let pool = detector.pool();
    let queued = pool.queued_jobs();
    let capacity = pool.queue_capacity();
    let status = if queued >= capacity { "degraded" } else { "healthy" };

    info!("Health check: status={}, queued={}/{}", status, queued, capacity);
    HttpResponse::Ok().json(HealthStatus {
        status: status.to_string(),
        workers: pool.workers(),
        queue_capacity: capacity,
        queued_jobs: queued,
        uptime_secs: started_at.0.elapsed().as_secs(),
    })
}
