use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::AppState;

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub listings_total: u64,
}

fn render(metrics: &MetricsResponse) -> String {
    format!(
        "# HELP http_requests_total Total number of HTTP requests\n\
         # TYPE http_requests_total counter\n\
         http_requests_total {}\n\
         \n\
         # HELP http_errors_total Total number of HTTP 5xx responses\n\
         # TYPE http_errors_total counter\n\
         http_errors_total {}\n\
         \n\
         # HELP wanderlust_listings Number of stored listings\n\
         # TYPE wanderlust_listings gauge\n\
         wanderlust_listings {}\n",
        metrics.http_requests_total, metrics.http_errors_total, metrics.listings_total
    )
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Prometheus text metrics", body = String, content_type = "text/plain")
    )
)]
pub async fn get_metrics(state: web::Data<AppState>) -> HttpResponse {
    let listings_total = state.listings.count_listings().await.unwrap_or_else(|e| {
        log::warn!("⚠️  Could not count listings for metrics: {}", e);
        0
    });

    let metrics = MetricsResponse {
        http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
        http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
        listings_total,
    };

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(render(&metrics))
}
