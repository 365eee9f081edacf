//! Request metrics middleware

use axum::extract::MatchedPath;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "facto_api_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "facto_api_request_duration_seconds";

/// Register metric descriptions with the installed recorder
pub fn describe() {
    describe_counter!(REQUESTS_TOTAL, "Total number of API requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Duration of API requests in seconds"
    );
}

/// Count and time every request, labeled by matched route and status
pub async fn track(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(REQUESTS_TOTAL, "endpoint" => endpoint.clone(), "status" => status).increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());

    response
}
