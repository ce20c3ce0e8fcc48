//! Security response headers.

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Header values applied to every response.
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "nosniff";
    pub const X_FRAME_OPTIONS: &str = "DENY";
    pub const X_XSS_PROTECTION: &str = "1; mode=block";
    pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";
}

/// Adds standard security headers to every response.
///
/// HSTS is only emitted when `ARISAN__SECURITY__HSTS_ENABLED=true`,
/// since it must not be sent before TLS termination is in place.
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let response_headers = response.headers_mut();

    response_headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static(headers::X_CONTENT_TYPE_OPTIONS),
    );
    response_headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static(headers::X_FRAME_OPTIONS),
    );
    response_headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static(headers::X_XSS_PROTECTION),
    );

    if hsts_enabled() {
        response_headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(headers::STRICT_TRANSPORT_SECURITY),
        );
    }

    response
}

fn hsts_enabled() -> bool {
    std::env::var("ARISAN__SECURITY__HSTS_ENABLED")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}
