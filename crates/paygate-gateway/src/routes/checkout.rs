use crate::routes::found;
use crate::server::GatewayState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::warn;

/// `POST /__cfpay/checkout` — create a hosted checkout session.
///
/// Accepts `return_to` as a JSON body or a form field. On success the
/// caller is redirected (302) to the processor's hosted session; on any
/// failure the response is an explicit `stripe_failed` 500 with no
/// partial redirect.
pub async fn create_checkout(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let return_to = extract_return_to(&headers, &body);

    let base = state.config.origin_base();
    let encoded: String = url::form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
    let success_url = format!("{base}/__cfpay/success?r={encoded}");
    let cancel_url = format!("{base}/__cfpay");

    match state
        .stripe
        .create_checkout_session(&success_url, &cancel_url)
        .await
    {
        Ok(session_url) => found(&session_url),
        Err(e) => {
            warn!(error = %e, "Checkout session creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "stripe_failed", "session": null })),
            )
                .into_response()
        }
    }
}

fn extract_return_to(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let from_body = if content_type.contains("application/json") {
        serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["return_to"].as_str().map(|s| s.to_string()))
    } else {
        url::form_urlencoded::parse(body)
            .find(|(name, _)| name == "return_to")
            .map(|(_, value)| value.into_owned())
    };

    from_body
        .filter(|r| r.starts_with('/'))
        .unwrap_or_else(|| "/".to_string())
}
