//! Bypass-credential issuance and verification.
//!
//! Credentials are HMAC-SHA256 signed JWTs carried in the `cfpay_jwt`
//! cookie. Verification fails closed: any malformed, tampered, or expired
//! token is indistinguishable from "no credential" to the rest of the
//! gateway.

/// Bypass-cookie formatting and extraction.
pub mod cookie;
/// Token signing and verification.
pub mod token;

pub use cookie::{build_cookie, extract_token, COOKIE_NAME};
pub use token::{TokenService, VerifiedToken};
