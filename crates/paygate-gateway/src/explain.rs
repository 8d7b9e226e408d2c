use crate::challenge::FALLBACK_EXPLANATION;
use paygate_core::ExplainConfig;
use tracing::warn;

/// Text-generation collaborator that turns a gating intent into a short
/// human-readable explanation for the paywall page.
///
/// Explanation generation is decorative: one attempt, and any failure or
/// empty answer falls back to a fixed sentence. A broken collaborator must
/// never fail the request.
pub struct ExplainClient {
    config: Option<ExplainConfig>,
    http: reqwest::Client,
}

impl ExplainClient {
    pub fn new(config: Option<ExplainConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub async fn explain(&self, intent: &str) -> String {
        let Some(config) = &self.config else {
            return FALLBACK_EXPLANATION.to_string();
        };
        match self.generate(config, intent).await {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                warn!(intent, "Explanation generation failed, using fallback");
                FALLBACK_EXPLANATION.to_string()
            }
        }
    }

    async fn generate(&self, config: &ExplainConfig, intent: &str) -> Option<String> {
        let body = serde_json::json!({
            "model": config.model,
            "messages": [
                { "role": "system", "content": "You are a concise site helper." },
                { "role": "user",
                  "content": format!("Explain in <120 words why access is gated. Reason: {intent}") }
            ],
            "max_tokens": 160
        });
        let response = self
            .http
            .post(format!(
                "{}/v1/chat/completions",
                config.api_base.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", config.api_key))
            .json(&body)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let json: serde_json::Value = response.json().await.ok()?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
    }
}
