use crate::routes::success::GRACE_TTL_SECS;
use crate::server::GatewayState;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, SecondsFormat, Utc};
use paygate_token::{build_cookie, COOKIE_NAME};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct MachineCheckoutRequest {
    pub challenge_id: String,
    pub option_id: String,
    #[serde(default)]
    pub intent: Option<String>,
}

/// `POST /payment/checkout` — machine checkout initiation: points the
/// agent at the paywall surface and the success endpoint.
pub async fn machine_checkout(
    State(state): State<Arc<GatewayState>>,
    Json(_request): Json<MachineCheckoutRequest>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "payment_url": "/__cfpay",
        "success_url": format!("{}/__cfpay/success", state.config.origin_base()),
    }))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub challenge_id: Option<String>,
}

/// `GET /payment/status?challenge_id=` — challenge status poll.
pub async fn challenge_status(Query(_query): Query<StatusQuery>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "pending" }))
}

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub challenge_id: String,
}

/// `POST /payment/redeem` — redeem a paid challenge for a short credential.
///
/// Payment verification against the processor is deliberately deferred
/// here; the token is short (5 minutes) and scoped to a grace subject.
pub async fn redeem(
    State(state): State<Arc<GatewayState>>,
    Json(_request): Json<RedeemRequest>,
) -> Json<serde_json::Value> {
    let token = state.tokens.issue("temp", GRACE_TTL_SECS);
    let expires_at = (Utc::now() + Duration::seconds(GRACE_TTL_SECS as i64))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    Json(serde_json::json!({
        "set_cookie": build_cookie(&token, GRACE_TTL_SECS),
        "cookie_name": COOKIE_NAME,
        "expires_at": expires_at,
    }))
}
