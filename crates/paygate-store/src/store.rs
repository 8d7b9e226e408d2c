use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use paygate_core::{PaygateError, PaygateResult, Receipt};
use std::collections::HashMap;
use std::path::PathBuf;

/// Receipts are kept for 30 days.
pub const RETENTION_SECS: i64 = 86400 * 30;

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Record a receipt for a payment session. Overwrites any existing
    /// receipt for the same session id.
    async fn put(&self, session_id: &str, receipt: &Receipt) -> PaygateResult<()>;
    /// Fetch the receipt for a session, if present and within retention.
    async fn get(&self, session_id: &str) -> PaygateResult<Option<Receipt>>;
}

fn within_retention(receipt: &Receipt) -> bool {
    Utc::now() - receipt.recorded_at < Duration::seconds(RETENTION_SECS)
}

/// In-memory receipt store. Suitable for tests and single-process deploys.
#[derive(Default)]
pub struct MemoryReceiptStore {
    receipts: RwLock<HashMap<String, Receipt>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.receipts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.read().is_empty()
    }
}

#[async_trait]
impl ReceiptStore for MemoryReceiptStore {
    async fn put(&self, session_id: &str, receipt: &Receipt) -> PaygateResult<()> {
        self.receipts
            .write()
            .insert(session_id.to_string(), receipt.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> PaygateResult<Option<Receipt>> {
        let receipts = self.receipts.read();
        Ok(receipts
            .get(session_id)
            .filter(|r| within_retention(r))
            .cloned())
    }
}

/// File-based receipt store (one JSON file per session id). Good enough for MVP.
pub struct FileReceiptStore {
    dir: PathBuf,
}

impl FileReceiptStore {
    pub async fn new(dir: PathBuf) -> PaygateResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn receipt_path(&self, session_id: &str) -> PaygateResult<PathBuf> {
        // Session ids come from the payment processor; only accept the
        // character set they actually use before touching the filesystem.
        if session_id.is_empty()
            || !session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(PaygateError::Store(format!(
                "invalid session id: {session_id:?}"
            )));
        }
        Ok(self.dir.join(format!("{session_id}.json")))
    }
}

#[async_trait]
impl ReceiptStore for FileReceiptStore {
    async fn put(&self, session_id: &str, receipt: &Receipt) -> PaygateResult<()> {
        let path = self.receipt_path(session_id)?;
        let json = serde_json::to_string_pretty(receipt)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> PaygateResult<Option<Receipt>> {
        let path = self.receipt_path(session_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let receipt: Receipt = serde_json::from_str(&data)
            .map_err(|e| PaygateError::Store(format!("Failed to parse receipt: {e}")))?;
        Ok(Some(receipt).filter(within_retention))
    }
}
