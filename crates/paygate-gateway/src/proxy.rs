use crate::server::GatewayError;
use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use paygate_core::PaygateError;
use tracing::warn;

/// Pass a request through to the origin and relay the answer byte-for-byte.
///
/// Method, headers, and body are forwarded unchanged apart from the
/// scheme/host substitution; hop-by-hop headers are stripped on both legs.
/// Any origin failure maps to a generic 502 with no upstream detail.
pub async fn forward(http: &reqwest::Client, origin_base: &str, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{origin_base}{path_and_query}");

    let mut headers = parts.headers.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let mut upstream_req = http.request(parts.method.clone(), &url).headers(headers);
    if parts.method != Method::GET && parts.method != Method::HEAD {
        match to_bytes(body, usize::MAX).await {
            Ok(bytes) => upstream_req = upstream_req.body(bytes),
            Err(e) => {
                return GatewayError::from(PaygateError::Http(format!(
                    "failed to read request body: {e}"
                )))
                .into_response()
            }
        }
    }

    let upstream = match upstream_req.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(url = %url, error = %e, "Origin fetch failed");
            return bad_gateway();
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    response_headers.remove(header::TRANSFER_ENCODING);
    response_headers.remove(header::CONTENT_LENGTH);
    response_headers.remove(header::CONNECTION);

    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Origin body read failed");
            bad_gateway()
        }
    }
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "error": "origin_unreachable" })),
    )
        .into_response()
}
