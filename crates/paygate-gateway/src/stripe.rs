use paygate_core::{PaygateError, PaygateResult, StripeConfig};

/// Payment-processor client: creates hosted checkout sessions.
///
/// One attempt per call; any failure maps to the `stripe_failed` response
/// at the route, with no partial redirect.
pub struct StripeClient {
    config: StripeConfig,
    http: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Create a checkout session and return the hosted session URL.
    ///
    /// `success_url` already carries the `r=<return_to>` query so the
    /// success endpoint can redirect the payer back.
    pub async fn create_checkout_session(
        &self,
        success_url: &str,
        cancel_url: &str,
    ) -> PaygateResult<String> {
        let params = [
            ("mode", "payment"),
            ("line_items[0][price]", self.config.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];
        let response = self
            .http
            .post(format!(
                "{}/v1/checkout/sessions",
                self.config.api_base.trim_end_matches('/')
            ))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaygateError::Checkout(format!("session creation failed: {e}")))?
            .error_for_status()
            .map_err(|e| PaygateError::Checkout(format!("session creation rejected: {e}")))?;

        let session: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PaygateError::Checkout(format!("bad session payload: {e}")))?;
        session["url"]
            .as_str()
            .map(|u| u.to_string())
            .ok_or_else(|| PaygateError::Checkout("session has no hosted url".to_string()))
    }
}
