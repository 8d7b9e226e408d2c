#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests for the gateway: classification, challenges, cookie
//! pass-through, webhook idempotency, and the control surface. The origin
//! and the payment processor are wiremock doubles.

use paygate_core::GatewayConfig;
use paygate_gateway::GatewayServer;
use paygate_store::{MemoryReceiptStore, ReceiptStore};
use paygate_token::TokenService;
use std::sync::Arc;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-secret";

fn test_config(origin_uri: &str, stripe_uri: &str) -> GatewayConfig {
    let toml = format!(
        r#"
        signing_secret = "{SECRET}"
        origin_host = "{origin_uri}"
        premium_prefixes = ["/reports"]

        [stripe]
        api_base = "{stripe_uri}"
        secret_key = "sk_test"
        price_id = "price_test"
    "#
    );
    toml::from_str(&toml).unwrap()
}

/// Boot the gateway on an OS-assigned port in front of wiremock doubles.
async fn start_gateway() -> (String, MockServer, MockServer, Arc<MemoryReceiptStore>) {
    // A bare (non-pooled) origin server, so dropping it actually closes
    // the listener; tests that tear the origin down rely on that.
    let origin = MockServer::builder().start().await;
    let stripe = MockServer::start().await;
    let receipts = Arc::new(MemoryReceiptStore::new());
    let app = GatewayServer::build(
        test_config(&origin.uri(), &stripe.uri()),
        receipts.clone() as Arc<dyn ReceiptStore>,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{}", addr.port()), origin, stripe, receipts)
}

/// A client that does not follow redirects, so 302s can be asserted.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn challenge_id_from_header(header: &str) -> &str {
    header
        .split("challenge_id=")
        .nth(1)
        .and_then(|rest| rest.split(';').next())
        .unwrap()
}

#[tokio::test]
async fn test_suspicious_agent_gets_402_challenge() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/some/report"))
        .header("cf-ipcountry", "T1")
        .header("accept", "application/json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 402);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let agent_challenge = resp
        .headers()
        .get("agent-challenge")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(agent_challenge.starts_with("v1 challenge_id="));
    assert!(agent_challenge.contains("; expires="));
    assert!(resp.headers().contains_key("link"));

    let body: serde_json::Value = resp.json().await.unwrap();
    // The id in the body and the discovery header must match verbatim.
    assert_eq!(
        body["challenge_id"].as_str().unwrap(),
        challenge_id_from_header(&agent_challenge)
    );
    assert!(body["options"].as_array().unwrap().len() >= 2);
    assert_eq!(body["return_to"], "/some/report");
    assert_eq!(body["post_payment_token"]["cookie_name"], "cfpay_jwt");
}

#[tokio::test]
async fn test_agent_capabilities_header_triggers_402() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/some/report"))
        .header("cf-ipcountry", "T1")
        .header("agent-capabilities", "paywall-v1")
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 402);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["options"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_suspicious_human_gets_paywall_redirect() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/some/report"))
        .header("cf-ipcountry", "T1")
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
    let location = resp.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("/__cfpay?why="));
    assert!(location.contains("return_to=%2Fsome%2Freport"));
}

#[tokio::test]
async fn test_valid_cookie_bypasses_suspicion() {
    let (gw, origin, _stripe, _receipts) = start_gateway().await;
    Mock::given(method("GET"))
        .and(path("/some/report"))
        .respond_with(ResponseTemplate::new(200).set_body_string("origin content"))
        .mount(&origin)
        .await;

    let token = TokenService::new(SECRET.as_bytes().to_vec()).issue("tester", 60);
    let resp = client()
        .get(format!("{gw}/some/report"))
        .header("cf-ipcountry", "T1")
        .header("user-agent", "curl/8.5.0")
        .header("cookie", format!("cfpay_jwt={token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "origin content");
}

#[tokio::test]
async fn test_foreign_cookie_is_treated_as_absent() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    // Signed with a different secret — verification fails closed.
    let token = TokenService::new("other-secret".as_bytes().to_vec()).issue("tester", 60);
    let resp = client()
        .get(format!("{gw}/some/report"))
        .header("cf-ipcountry", "T1")
        .header("accept", "text/html")
        .header("cookie", format!("cfpay_jwt={token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
}

#[tokio::test]
async fn test_normal_traffic_passes_through() {
    let (gw, origin, _stripe, _receipts) = start_gateway().await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&origin)
        .await;

    let resp = client()
        .get(format!("{gw}/landing"))
        .header("accept", "text/html")
        .header("user-agent", "Mozilla/5.0")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "welcome");
}

#[tokio::test]
async fn test_premium_path_is_gated_for_ordinary_browser() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/reports/q3"))
        .header("accept", "text/html")
        .header("user-agent", "Mozilla/5.0")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
}

#[tokio::test]
async fn test_webhook_completed_mints_token_and_receipt() {
    let (gw, _origin, _stripe, receipts) = start_gateway().await;
    let event = serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_sess_1",
            "customer_details": { "email": "payer@example.com" }
        }}
    });

    let resp = client()
        .post(format!("{gw}/__cfpay/payment-webhook"))
        .body(event.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let token = body["token"].as_str().unwrap();
    let verified = TokenService::new(SECRET.as_bytes().to_vec())
        .verify(token)
        .unwrap();
    assert_eq!(verified.subject, "payer@example.com");

    let receipt = receipts.get("cs_sess_1").await.unwrap().unwrap();
    assert_eq!(receipt.payer, "payer@example.com");
}

#[tokio::test]
async fn test_webhook_replay_is_idempotent_but_tokens_differ() {
    let (gw, _origin, _stripe, receipts) = start_gateway().await;
    let event = serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_replay" } }
    })
    .to_string();

    let first: serde_json::Value = client()
        .post(format!("{gw}/__cfpay/payment-webhook"))
        .body(event.clone())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = client()
        .post(format!("{gw}/__cfpay/payment-webhook"))
        .body(event)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Exactly one receipt, two distinct and independently valid tokens.
    assert_eq!(receipts.len(), 1);
    let svc = TokenService::new(SECRET.as_bytes().to_vec());
    let a = first["token"].as_str().unwrap();
    let b = second["token"].as_str().unwrap();
    assert_ne!(a, b);
    assert!(svc.verify(a).is_some());
    assert!(svc.verify(b).is_some());
    // No email in the session: falls back to the session id as subject.
    assert_eq!(svc.verify(a).unwrap().subject, "cs_replay");
}

#[tokio::test]
async fn test_webhook_ignores_other_event_types() {
    let (gw, _origin, _stripe, receipts) = start_gateway().await;

    let resp = client()
        .post(format!("{gw}/__cfpay/payment-webhook"))
        .body(r#"{"id":"evt_2","type":"invoice.paid","data":{"object":{"id":"in_1"}}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert!(body.get("token").is_none());
    assert!(receipts.is_empty());
}

#[tokio::test]
async fn test_webhook_tolerates_malformed_events() {
    let (gw, _origin, _stripe, receipts) = start_gateway().await;

    for bad in ["not json at all", "{}", r#"{"type":"checkout.session.completed"}"#] {
        let resp = client()
            .post(format!("{gw}/__cfpay/payment-webhook"))
            .body(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "payload {bad:?} must be acknowledged");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert!(body.get("token").is_none());
    }
    assert!(receipts.is_empty());
}

#[tokio::test]
async fn test_success_sets_cookie_and_redirects() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/__cfpay/success?r=/back/here"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers().get("location").unwrap(), "/back/here");
    let cookie = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("cfpay_jwt="));
    assert!(cookie.contains("Max-Age=300"));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .strip_prefix("cfpay_jwt=")
        .unwrap()
        .split(';')
        .next()
        .unwrap();
    let verified = TokenService::new(SECRET.as_bytes().to_vec())
        .verify(token)
        .unwrap();
    assert_eq!(verified.subject, "temp");
}

#[tokio::test]
async fn test_control_paths_are_never_gated() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    // Maximally suspicious request, yet the paywall page must render.
    let resp = client()
        .get(format!("{gw}/__cfpay?why=test"))
        .header("cf-ipcountry", "T1")
        .header("user-agent", "curl/8.5.0")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    // No explanation collaborator is configured: the fallback sentence shows.
    assert!(html.contains("You can purchase access or verify to continue."));
    assert!(html.contains("/__cfpay/checkout"));
}

#[tokio::test]
async fn test_checkout_redirects_to_hosted_session() {
    let (gw, _origin, stripe, _receipts) = start_gateway().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cs_1",
            "url": "https://checkout.stripe.test/pay/cs_1"
        })))
        .mount(&stripe)
        .await;

    let resp = client()
        .post(format!("{gw}/__cfpay/checkout"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("return_to=%2Fdeep%2Fpage")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "https://checkout.stripe.test/pay/cs_1"
    );
}

#[tokio::test]
async fn test_checkout_failure_is_explicit() {
    let (gw, _origin, stripe, _receipts) = start_gateway().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&stripe)
        .await;

    let resp = client()
        .post(format!("{gw}/__cfpay/checkout"))
        .json(&serde_json::json!({ "return_to": "/deep/page" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "stripe_failed");
}

#[tokio::test]
async fn test_well_known_descriptor() {
    let (gw, origin, _stripe, _receipts) = start_gateway().await;

    let resp = client()
        .get(format!("{gw}/.well-known/agent-paywall"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["version"], "1");
    assert_eq!(body["token_format"], "jwt_cookie");
    assert_eq!(body["cookie_name"], "cfpay_jwt");
    let host = origin.uri().trim_start_matches("http://").to_string();
    assert_eq!(
        body["support"].as_str().unwrap(),
        format!("mailto:admin@{host}")
    );
}

#[tokio::test]
async fn test_machine_payment_endpoints() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;
    let http = client();

    let checkout: serde_json::Value = http
        .post(format!("{gw}/payment/checkout"))
        .json(&serde_json::json!({ "challenge_id": "abc", "option_id": "one_time_50c" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(checkout["payment_url"], "/__cfpay");
    assert!(checkout["success_url"]
        .as_str()
        .unwrap()
        .ends_with("/__cfpay/success"));

    let status: serde_json::Value = http
        .get(format!("{gw}/payment/status?challenge_id=abc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "pending");

    let redeem: serde_json::Value = http
        .post(format!("{gw}/payment/redeem"))
        .json(&serde_json::json!({ "challenge_id": "abc" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(redeem["cookie_name"], "cfpay_jwt");
    let cookie = redeem["set_cookie"].as_str().unwrap();
    assert!(cookie.starts_with("cfpay_jwt="));
    let token = cookie
        .strip_prefix("cfpay_jwt=")
        .unwrap()
        .split(';')
        .next()
        .unwrap();
    assert!(TokenService::new(SECRET.as_bytes().to_vec())
        .verify(token)
        .is_some());
}

#[tokio::test]
async fn test_openapi_document_is_never_gated() {
    let (gw, _origin, _stripe, _receipts) = start_gateway().await;

    // The Link header and the descriptor both point agents here; a
    // suspicious caller following them must get the document, not a
    // challenge loop.
    let resp = client()
        .get(format!("{gw}/openapi.json"))
        .header("user-agent", "curl/8.5.0")
        .header("accept", "application/json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["openapi"], "3.0.0");
    assert!(body["paths"].get("/__cfpay").is_some());
}

/// A receipt store whose writes always fail, standing in for a broken
/// backing service.
struct BrokenReceiptStore;

#[async_trait::async_trait]
impl ReceiptStore for BrokenReceiptStore {
    async fn put(
        &self,
        _session_id: &str,
        _receipt: &paygate_core::Receipt,
    ) -> paygate_core::PaygateResult<()> {
        Err(paygate_core::PaygateError::Store(
            "backing store unavailable".to_string(),
        ))
    }

    async fn get(
        &self,
        _session_id: &str,
    ) -> paygate_core::PaygateResult<Option<paygate_core::Receipt>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_receipt_store_failure_does_not_block_token_issuance() {
    let origin = MockServer::start().await;
    let stripe = MockServer::start().await;
    let app = GatewayServer::build(
        test_config(&origin.uri(), &stripe.uri()),
        Arc::new(BrokenReceiptStore),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let gw = format!("http://127.0.0.1:{}", addr.port());

    let event = serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_sess_1",
            "customer_details": { "email": "payer@example.com" }
        }}
    });
    let resp = client()
        .post(format!("{gw}/__cfpay/payment-webhook"))
        .body(event.to_string())
        .send()
        .await
        .unwrap();

    // The receipt is best-effort bookkeeping: the webhook still succeeds
    // and the token is still minted.
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    let token = body["token"].as_str().unwrap();
    assert!(TokenService::new(SECRET.as_bytes().to_vec())
        .verify(token)
        .is_some());
}

#[tokio::test]
async fn test_origin_failure_maps_to_502() {
    let (gw, origin, _stripe, _receipts) = start_gateway().await;
    // Tear the origin down so the proxy fetch fails.
    drop(origin);

    let resp = client()
        .get(format!("{gw}/landing"))
        .header("accept", "text/html")
        .header("user-agent", "Mozilla/5.0")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "origin_unreachable");
}

#[tokio::test]
async fn test_post_bodies_are_forwarded() {
    let (gw, origin, _stripe, _receipts) = start_gateway().await;
    Mock::given(method("POST"))
        .and(path("/api/echo"))
        .and(wiremock::matchers::body_string("payload-bytes"))
        .respond_with(ResponseTemplate::new(201).set_body_string("stored"))
        .mount(&origin)
        .await;

    let resp = client()
        .post(format!("{gw}/api/echo"))
        .header("user-agent", "Mozilla/5.0")
        .body("payload-bytes")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    assert_eq!(resp.text().await.unwrap(), "stored");
}
