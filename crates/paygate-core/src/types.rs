use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-request categorization of the caller.
///
/// `Trusted` is decided by the orchestrator (valid bypass credential) before
/// the classifier ever runs; the classifier itself only produces the other
/// three variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Trusted,
    SuspiciousAgent,
    SuspiciousHuman,
    Normal,
}

impl Classification {
    pub fn is_suspicious(self) -> bool {
        matches!(self, Self::SuspiciousAgent | Self::SuspiciousHuman)
    }
}

/// One purchasable pass from the configured catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOption {
    pub id: String,
    pub kind: String,
    pub amount_cents: u32,
    pub ttl_seconds: u64,
}

/// Record of a completed payment event, keyed by the payment session id.
///
/// Writing a receipt for the same session id twice overwrites the first;
/// there is never more than one receipt per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub payer: String,
    pub recorded_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(payer: impl Into<String>) -> Self {
        Self {
            payer: payer.into(),
            recorded_at: Utc::now(),
        }
    }
}
