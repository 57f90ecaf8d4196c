use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "card_service_http_requests_total",
        "Total HTTP requests processed, by method and status",
        &["method", "status"]
    )
    .expect("failed to register http requests counter");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "card_service_http_request_duration_seconds",
        "HTTP request latency in seconds, by method",
        &["method"]
    )
    .expect("failed to register request duration histogram");

    pub static ref RATE_LIMIT_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "card_service_rate_limit_rejections_total",
        "Requests rejected by the rate limiter, by endpoint",
        &["endpoint"]
    )
    .expect("failed to register rate limit rejections counter");

    pub static ref LOGIN_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "card_service_login_attempts_total",
        "Login attempts, by outcome",
        &["outcome"]
    )
    .expect("failed to register login attempts counter");

    pub static ref REGISTRATIONS_TOTAL: IntCounter = register_int_counter!(
        "card_service_registrations_total",
        "Accounts created"
    )
    .expect("failed to register registrations counter");

    pub static ref CARDS_IMPORTED_TOTAL: IntCounter = register_int_counter!(
        "card_service_cards_imported_total",
        "Cards created through bulk import"
    )
    .expect("failed to register cards imported counter");
}

/// Prometheus exposition endpoint.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
