//! Receipt bookkeeping for completed payments.
//!
//! Receipts are best-effort: the bypass token is the security-relevant
//! artifact, and a failed receipt write never blocks issuance. Stores are
//! idempotent by session id — writing the same id twice overwrites.

pub mod store;

pub use store::{FileReceiptStore, MemoryReceiptStore, ReceiptStore, RETENTION_SECS};
