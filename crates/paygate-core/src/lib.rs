//! Shared types for the Paygate edge access gateway.
//!
//! # Main types
//!
//! - [`PaygateError`] / [`PaygateResult`] — the error type used across all crates.
//! - [`GatewayConfig`] — immutable process-wide configuration, loaded once at startup.
//! - [`Classification`] — per-request caller categorization.
//! - [`PurchaseOption`] — one entry of the configured pass catalog.
//! - [`Receipt`] — idempotent record of a completed payment, keyed by session id.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ExplainConfig, GatewayConfig, ServerConfig, StripeConfig};
pub use error::{PaygateError, PaygateResult};
pub use types::{Classification, PurchaseOption, Receipt};
