use axum::http::HeaderMap;
use paygate_core::{Classification, GatewayConfig};
use regex::Regex;

/// Typed view of the header and connection signals classification runs on.
#[derive(Debug, Clone, Default)]
pub struct RequestSignals {
    pub path: String,
    pub ip_country: Option<String>,
    pub bot_score: Option<u8>,
    pub visitor: Option<String>,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub agent_capabilities: Option<String>,
}

impl RequestSignals {
    pub fn from_request(headers: &HeaderMap, path: &str) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        Self {
            path: path.to_string(),
            ip_country: header("cf-ipcountry"),
            bot_score: header("cf-bot-score").and_then(|s| s.parse().ok()),
            visitor: header("cf-visitor"),
            user_agent: header("user-agent"),
            accept: header("accept"),
            agent_capabilities: header("agent-capabilities"),
        }
    }
}

/// Classification outcome for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub classification: Classification,
    pub prefers_machine_response: bool,
}

/// Classifies callers from request signals.
///
/// Each signal is a named predicate; the combination is a single ordered
/// precedence list. Absence of every signal classifies as `Normal` —
/// suspicion requires an explicit signal, never its absence.
pub struct Classifier {
    bot_score_threshold: u8,
    premium_prefixes: Vec<String>,
    cli_client: Regex,
    agent_name: Regex,
}

impl Classifier {
    // Patterns are compile-time constants; expect never fires.
    #[allow(clippy::expect_used)]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            bot_score_threshold: config.bot_score_threshold,
            premium_prefixes: config.premium_prefixes.clone(),
            cli_client: Regex::new(r"(?i)curl|wget|httpie|python-requests")
                .expect("pattern is valid"),
            agent_name: Regex::new(r"(?i)Agent/").expect("pattern is valid"),
        }
    }

    pub fn classify(&self, signals: &RequestSignals) -> Verdict {
        let prefers_machine_response = self.accepts_json(signals)
            || self.agent_capable(signals)
            || self.agent_user_agent(signals);

        let suspicious = self.anonymizing_network(signals)
            || self.low_bot_score(signals)
            || self.cli_user_agent(signals)
            || self.bot_visitor(signals)
            || self.premium_path(signals);

        let classification = match (suspicious, prefers_machine_response) {
            (true, true) => Classification::SuspiciousAgent,
            (true, false) => Classification::SuspiciousHuman,
            (false, _) => Classification::Normal,
        };
        Verdict {
            classification,
            prefers_machine_response,
        }
    }

    // -- machine-preference predicates --

    fn accepts_json(&self, s: &RequestSignals) -> bool {
        s.accept
            .as_deref()
            .is_some_and(|a| a.contains("application/json"))
    }

    fn agent_capable(&self, s: &RequestSignals) -> bool {
        s.agent_capabilities
            .as_deref()
            .is_some_and(|c| c.contains("paywall-v1"))
    }

    fn agent_user_agent(&self, s: &RequestSignals) -> bool {
        s.user_agent
            .as_deref()
            .is_some_and(|ua| self.agent_name.is_match(ua))
    }

    // -- suspicion predicates --

    fn anonymizing_network(&self, s: &RequestSignals) -> bool {
        // T1 is the country code anonymizing-network exits report.
        s.ip_country.as_deref() == Some("T1")
    }

    fn low_bot_score(&self, s: &RequestSignals) -> bool {
        s.bot_score.is_some_and(|score| score < self.bot_score_threshold)
    }

    fn cli_user_agent(&self, s: &RequestSignals) -> bool {
        s.user_agent
            .as_deref()
            .is_some_and(|ua| self.cli_client.is_match(ua))
    }

    fn bot_visitor(&self, s: &RequestSignals) -> bool {
        s.visitor.as_deref().is_some_and(|v| v.contains("bot"))
    }

    fn premium_path(&self, s: &RequestSignals) -> bool {
        self.premium_prefixes
            .iter()
            .any(|prefix| s.path.starts_with(prefix.as_str()))
    }
}
