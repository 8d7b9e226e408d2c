use crate::routes::found;
use crate::server::GatewayState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use paygate_token::build_cookie;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// 5-minute grace credential issued on the post-payment redirect.
pub const GRACE_TTL_SECS: u64 = 300;

#[derive(Deserialize)]
pub struct SuccessQuery {
    pub r: Option<String>,
}

/// `GET /__cfpay/success?r=<path>` — set the bypass cookie and send the
/// payer back to where they came from.
pub async fn payment_success(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<SuccessQuery>,
) -> Response {
    let return_path = query
        .r
        .filter(|r| r.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    let token = state.tokens.issue("temp", GRACE_TTL_SECS);
    info!(return_path = %return_path, "Issuing grace credential after payment");

    let mut response = found(&return_path);
    if let Ok(value) = HeaderValue::from_str(&build_cookie(&token, GRACE_TTL_SECS)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
