use crate::server::GatewayState;
use axum::extract::State;
use axum::Json;
use paygate_core::Receipt;
use std::sync::Arc;
use tracing::{info, warn};

/// TTL of the credential minted for a completed payment.
pub const PAID_TTL_SECS: u64 = 3600;

const COMPLETED_EVENT: &str = "checkout.session.completed";

/// `POST /__cfpay/payment-webhook` — payment-processor event listener.
///
/// Only `checkout.session.completed` mints a credential and records a
/// receipt. Everything else — unknown types, malformed envelopes — is
/// acknowledged with `{ok:true}` so the processor never retries; a hard
/// failure here would provoke redelivery storms.
pub async fn payment_webhook(
    State(state): State<Arc<GatewayState>>,
    body: String,
) -> Json<serde_json::Value> {
    let Ok(event) = serde_json::from_str::<serde_json::Value>(&body) else {
        return Json(serde_json::json!({ "ok": true }));
    };
    if event["type"].as_str() != Some(COMPLETED_EVENT) {
        return Json(serde_json::json!({ "ok": true }));
    }
    let Some(session) = event.get("data").and_then(|d| d.get("object")) else {
        return Json(serde_json::json!({ "ok": true }));
    };

    let session_id = session["id"].as_str();
    let subject = session["customer_details"]["email"]
        .as_str()
        .or(session_id)
        .unwrap_or("anon");

    // Each delivery mints a fresh token; replays are safe because tokens
    // are short-lived and scoped to the subject, not the event.
    let token = state.tokens.issue(subject, PAID_TTL_SECS);
    info!(subject = %subject, "Issued bypass credential for completed checkout");

    if let Some(sid) = session_id {
        // The token is the security-relevant artifact; the receipt is
        // best-effort bookkeeping and must not block issuance.
        if let Err(e) = state.receipts.put(sid, &Receipt::new(subject)).await {
            warn!(session_id = %sid, error = %e, "Receipt write failed, token issued anyway");
        }
    }

    Json(serde_json::json!({ "ok": true, "token": token }))
}
