use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, SecondsFormat, Utc};
use paygate_core::{GatewayConfig, PurchaseOption};
use paygate_token::COOKIE_NAME;
use serde::Serialize;
use uuid::Uuid;

/// Machine challenges expire 5 minutes after issuance.
pub const CHALLENGE_TTL_SECS: i64 = 300;

/// Used whenever the explanation collaborator fails or returns nothing.
pub const FALLBACK_EXPLANATION: &str = "You can purchase access or verify to continue.";

const LINK_HEADER: &str =
    r#"</.well-known/agent-paywall>; rel="paywall", </openapi.json>; rel="service-desc""#;

/// Machine rendering of a challenge, delivered as `application/problem+json`.
#[derive(Debug, Clone, Serialize)]
pub struct MachineChallenge {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub detail: String,
    pub challenge_id: Uuid,
    pub options: Vec<PurchaseOption>,
    pub payment_methods: Vec<String>,
    pub post_payment_token: PostPaymentToken,
    pub return_to: String,
    pub terms_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPaymentToken {
    pub format: String,
    pub cookie_name: String,
}

/// Human rendering of a challenge: the data a paywall page needs.
/// HTML templating happens at the route, not here.
#[derive(Debug, Clone)]
pub struct HumanChallenge {
    pub message: String,
    pub return_to: String,
    pub checkout_action: String,
    pub contact: String,
}

/// Build a fresh machine challenge from the configured catalog.
///
/// The challenge id is a v4 UUID from the OS random source; it must be
/// unpredictable.
pub fn respond_machine(config: &GatewayConfig, return_to: &str) -> MachineChallenge {
    MachineChallenge {
        problem_type: config.problem_type.clone(),
        title: "Payment or verification required".to_string(),
        detail: "Choose a pass to continue.".to_string(),
        challenge_id: Uuid::new_v4(),
        options: config.options.clone(),
        payment_methods: config.payment_methods.clone(),
        post_payment_token: PostPaymentToken {
            format: "jwt_cookie".to_string(),
            cookie_name: COOKIE_NAME.to_string(),
        },
        return_to: return_to.to_string(),
        terms_url: config.terms_url.clone(),
    }
}

/// Build the human-challenge data for a paywall page.
pub fn respond_human(message: String, return_to: &str, config: &GatewayConfig) -> HumanChallenge {
    HumanChallenge {
        message,
        return_to: return_to.to_string(),
        checkout_action: "/__cfpay/checkout".to_string(),
        contact: format!("admin@{}", config.origin_host_only()),
    }
}

/// Render a machine challenge as the full 402 HTTP response.
///
/// The challenge id appears verbatim in both the body and the
/// `Agent-Challenge` header.
pub fn machine_response(config: &GatewayConfig, return_to: &str) -> Response {
    let challenge = respond_machine(config, return_to);
    let expires = (Utc::now() + Duration::seconds(CHALLENGE_TTL_SECS))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let agent_challenge = format!(
        "v1 challenge_id={}; expires={expires}",
        challenge.challenge_id
    );

    let mut response = (StatusCode::PAYMENT_REQUIRED, Json(&challenge)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    if let Ok(value) = HeaderValue::from_str(&agent_challenge) {
        headers.insert(HeaderName::from_static("agent-challenge"), value);
    }
    headers.insert(
        axum::http::header::LINK,
        HeaderValue::from_static(LINK_HEADER),
    );
    response
}
