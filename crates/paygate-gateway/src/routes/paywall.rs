use crate::challenge::{self, HumanChallenge};
use crate::routes::escape_html;
use crate::server::GatewayState;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct PaywallQuery {
    pub why: Option<String>,
    pub return_to: Option<String>,
}

/// `GET /__cfpay` — the human paywall page.
///
/// The `why` intent feeds the explanation collaborator; the page never
/// fails because of it (fixed fallback sentence on any failure).
pub async fn paywall_page(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<PaywallQuery>,
) -> Html<String> {
    let intent = query
        .why
        .unwrap_or_else(|| "Access blocked or premium content.".to_string());
    let return_to = query
        .return_to
        .filter(|r| r.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    let message = state.explain.explain(&intent).await;
    let page = challenge::respond_human(message, &return_to, &state.config);
    Html(render(&page))
}

fn render(page: &HumanChallenge) -> String {
    format!(
        r#"<!doctype html><html><head><meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Access Gateway</title>
<style>
  body{{font-family:ui-sans-serif,system-ui;margin:0;padding:2rem;max-width:680px}}
  .card{{border:1px solid #ddd;border-radius:16px;padding:1.25rem}}
  .btn{{display:inline-block;padding:.8rem 1.1rem;border-radius:10px;border:1px solid #333;text-decoration:none}}
  .small{{opacity:.7;font-size:.9rem}}
</style></head>
<body>
  <h1>Verify or Get Instant Access</h1>
  <div class="card"><p>{message}</p></div>
  <p class="small">Detected as: bot/suspicious/unknown. If this is a mistake, continue.</p>
  <form id="pay" method="POST" action="{action}">
    <input type="hidden" name="return_to" value="{return_to}">
    <button class="btn" type="submit">Pay $0.50 to continue</button>
  </form>
  <p class="small">Problems? Contact {contact}</p>
</body></html>"#,
        message = escape_html(&page.message),
        action = page.checkout_action,
        return_to = escape_html(&page.return_to),
        contact = escape_html(&page.contact),
    )
}
