use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Paywall, checkout, and success pages (`/__cfpay/*`).
pub mod checkout;
/// Agent service-discovery descriptor.
pub mod descriptor;
/// Machine payment endpoints (`/payment/*`).
pub mod payment;
/// Human paywall page.
pub mod paywall;
/// Post-payment success redirect.
pub mod success;
/// Payment-processor webhook.
pub mod webhook;

/// A 302 redirect. axum's `Redirect` only offers 303/307/308, and callers
/// of this gateway expect the classic 302.
pub(crate) fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

/// Minimal HTML escaping for values interpolated into the paywall page.
pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
