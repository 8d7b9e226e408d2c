use crate::types::PurchaseOption;
use serde::Deserialize;
use std::path::PathBuf;

/// Process-wide gateway configuration.
///
/// Loaded once at startup and treated as immutable for the process lifetime.
/// Every component receives the pieces it needs through its constructor; no
/// handler reaches into ambient state.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Shared secret for signing bypass tokens. Known only to the gateway.
    pub signing_secret: String,
    /// Host of the origin service requests are proxied to. A bare host is
    /// reached over https; a value with an explicit scheme is used as-is.
    pub origin_host: String,
    /// Bot-reputation scores strictly below this are suspicious.
    #[serde(default = "default_bot_score_threshold")]
    pub bot_score_threshold: u8,
    /// Path prefixes that are gated regardless of other signals.
    #[serde(default)]
    pub premium_prefixes: Vec<String>,
    /// Pass catalog offered in challenges. Fixed configuration, never computed.
    #[serde(default = "default_options")]
    pub options: Vec<PurchaseOption>,
    #[serde(default = "default_payment_methods")]
    pub payment_methods: Vec<String>,
    #[serde(default = "default_problem_type")]
    pub problem_type: String,
    #[serde(default = "default_terms_url")]
    pub terms_url: String,
    pub stripe: StripeConfig,
    /// Text-generation collaborator for paywall explanations. Absent means
    /// the fixed fallback sentence is always used.
    #[serde(default)]
    pub explain: Option<ExplainConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    /// Where file-backed state (receipts) lives.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl GatewayConfig {
    /// Base URL of the origin service, for the pass-through proxy.
    pub fn origin_base(&self) -> String {
        if self.origin_host.contains("://") {
            self.origin_host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.origin_host)
        }
    }

    /// Host part of the origin, for descriptor/contact strings.
    pub fn origin_host_only(&self) -> &str {
        match self.origin_host.split_once("://") {
            Some((_, rest)) => rest.trim_end_matches('/'),
            None => &self.origin_host,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    #[serde(default = "default_stripe_base")]
    pub api_base: String,
    #[serde(default)]
    pub secret_key: String,
    pub price_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainConfig {
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_bot_score_threshold() -> u8 {
    30
}
fn default_options() -> Vec<PurchaseOption> {
    vec![
        PurchaseOption {
            id: "one_time_50c".to_string(),
            kind: "one_time".to_string(),
            amount_cents: 50,
            ttl_seconds: 3600,
        },
        PurchaseOption {
            id: "day_pass_3".to_string(),
            kind: "one_time".to_string(),
            amount_cents: 300,
            ttl_seconds: 86400,
        },
    ]
}
fn default_payment_methods() -> Vec<String> {
    vec!["stripe_card".to_string()]
}
fn default_problem_type() -> String {
    "urn:paygate:payment-required".to_string()
}
fn default_terms_url() -> String {
    "/terms".to_string()
}
fn default_stripe_base() -> String {
    "https://api.stripe.com".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
