use crate::server::GatewayState;
use axum::extract::State;
use axum::Json;
use paygate_token::COOKIE_NAME;
use std::sync::Arc;

/// `GET /.well-known/agent-paywall` — machine-readable service descriptor
/// agents use to discover how this gateway's challenges work.
pub async fn well_known(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": "1",
        "service": "paygate",
        "service_desc": "/openapi.json",
        "token_format": "jwt_cookie",
        "cookie_name": COOKIE_NAME,
        "support": format!("mailto:admin@{}", state.config.origin_host_only()),
    }))
}

/// `GET /openapi.json` — the service description the `Link` header and the
/// descriptor point at. A discovery document, so it is part of the control
/// surface and never gated.
pub async fn openapi(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    let challenge_schema = serde_json::json!({
        "type": "object",
        "properties": {
            "challenge_id": { "type": "string", "format": "uuid" },
            "options": { "type": "array" },
            "payment_methods": { "type": "array" },
            "return_to": { "type": "string" }
        }
    });
    Json(serde_json::json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Paygate",
            "version": "0.1.0",
            "description": "Edge access gateway with a pay-to-bypass paywall."
        },
        "paths": {
            "/__cfpay": { "get": { "summary": "Human paywall page (HTML)" } },
            "/__cfpay/checkout": { "post": { "summary": "Create checkout session" } },
            "/__cfpay/success": { "get": { "summary": "Payment success redirect" } },
            "/__cfpay/payment-webhook": { "post": { "summary": "Payment event listener" } },
            "/.well-known/agent-paywall": { "get": { "summary": "Agent descriptor" } },
            "/payment/checkout": { "post": { "summary": "Machine checkout initiation" } },
            "/payment/status": { "get": { "summary": "Challenge status" } },
            "/payment/redeem": { "post": { "summary": "Redeem a paid challenge" } }
        },
        "components": {
            "schemas": {
                "Challenge": challenge_schema,
                "Option": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "kind": { "type": "string" },
                        "amount_cents": { "type": "integer" },
                        "ttl_seconds": { "type": "integer" }
                    },
                    "example": state.config.options.first(),
                }
            }
        }
    }))
}
