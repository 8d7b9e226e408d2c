use crate::classify::{Classifier, RequestSignals};
use crate::explain::ExplainClient;
use crate::stripe::StripeClient;
use crate::{challenge, proxy, routes};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use paygate_core::{Classification, GatewayConfig, PaygateError};
use paygate_store::ReceiptStore;
use paygate_token::TokenService;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared application state: the configuration and every collaborator,
/// constructed once at startup and injected into handlers. No globals.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub tokens: TokenService,
    pub receipts: Arc<dyn ReceiptStore>,
    pub classifier: Classifier,
    pub stripe: StripeClient,
    pub explain: ExplainClient,
    pub http: reqwest::Client,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, receipts: Arc<dyn ReceiptStore>) -> Self {
        Self {
            tokens: TokenService::new(config.signing_secret.as_bytes().to_vec()),
            classifier: Classifier::new(&config),
            stripe: StripeClient::new(config.stripe.clone()),
            explain: ExplainClient::new(config.explain.clone()),
            http: reqwest::Client::new(),
            config,
            receipts,
        }
    }
}

/// The gateway's top-level error: anything internal that escapes a
/// handler becomes a generic 500 with no detail leaked to the caller.
pub struct GatewayError(PaygateError);

impl From<PaygateError> for GatewayError {
    fn from(err: PaygateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Unhandled gateway error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "errors": [{ "code": 7000, "message": "Internal Server Error" }]
            })),
        )
            .into_response()
    }
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router: an explicit, immutable route table constructed
    /// once. Control paths are registered ahead of the fallback so they
    /// are never classified or gated (a gated paywall would redirect to
    /// itself forever).
    pub fn build(config: GatewayConfig, receipts: Arc<dyn ReceiptStore>) -> Router {
        let state = Arc::new(GatewayState::new(config, receipts));
        Router::new()
            .route("/__cfpay", get(routes::paywall::paywall_page))
            .route("/__cfpay/checkout", post(routes::checkout::create_checkout))
            .route("/__cfpay/success", get(routes::success::payment_success))
            .route(
                "/__cfpay/payment-webhook",
                post(routes::webhook::payment_webhook),
            )
            .route(
                "/.well-known/agent-paywall",
                get(routes::descriptor::well_known),
            )
            .route("/openapi.json", get(routes::descriptor::openapi))
            .route("/payment/checkout", post(routes::payment::machine_checkout))
            .route("/payment/status", get(routes::payment::challenge_status))
            .route("/payment/redeem", post(routes::payment::redeem))
            .fallback(orchestrate)
            .with_state(state)
    }
}

/// Per-request decision procedure for everything outside the control
/// surface: trusted → origin; normal → origin; suspicious → challenge.
async fn orchestrate(State(state): State<Arc<GatewayState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    // A valid bypass credential passes through unconditionally, before
    // any classification. An invalid one is treated exactly like no
    // credential at all.
    let bypass = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(paygate_token::extract_token)
        .is_some_and(|token| state.tokens.verify(token).is_some());
    if bypass {
        debug!(
            path = %path,
            classification = ?Classification::Trusted,
            "Valid bypass credential, passing through"
        );
        return proxy::forward(&state.http, &state.config.origin_base(), req).await;
    }

    let signals = RequestSignals::from_request(req.headers(), &path);
    let verdict = state.classifier.classify(&signals);
    if !verdict.classification.is_suspicious() {
        return proxy::forward(&state.http, &state.config.origin_base(), req).await;
    }

    info!(
        path = %path,
        classification = ?verdict.classification,
        machine = verdict.prefers_machine_response,
        "Gating request"
    );

    if verdict.prefers_machine_response {
        challenge::machine_response(&state.config, &path)
    } else {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("why", "Suspicious or premium access required.")
            .append_pair("return_to", &path)
            .finish();
        routes::found(&format!("/__cfpay?{query}"))
    }
}
