use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    /// Fresh per issuance, so tokens minted for the same subject in the
    /// same second are still distinct.
    jti: Uuid,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub expires_at: i64,
}

/// Issues and verifies signed, time-limited bypass credentials.
///
/// Stateless: signing and verification are pure computations over the
/// configured secret; no token is ever stored.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issue a bypass token for `subject`, valid for `ttl_secs` from now.
    pub fn issue(&self, subject: &str, ttl_secs: u64) -> String {
        self.issue_at(subject, ttl_secs, Utc::now().timestamp())
    }

    /// Verify a token, failing closed.
    ///
    /// Malformed structure, bad encoding, wrong algorithm, bad signature,
    /// and expiry all return `None`; the caller cannot tell which.
    pub fn verify(&self, token: &str) -> Option<VerifiedToken> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn issue_at(&self, subject: &str, ttl_secs: u64, now: i64) -> String {
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl_secs as i64,
            jti: Uuid::new_v4(),
        };
        // Claims serialization cannot fail: all fields are plain data.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let head = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());
        let body = URL_SAFE_NO_PAD.encode(payload);
        let signing_input = format!("{head}.{body}");
        let sig = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        format!("{signing_input}.{sig}")
    }

    fn verify_at(&self, token: &str, now: i64) -> Option<VerifiedToken> {
        let mut parts = token.split('.');
        let head = parts.next()?;
        let body = parts.next()?;
        let sig = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let header_bytes = URL_SAFE_NO_PAD.decode(head).ok()?;
        let header: serde_json::Value = serde_json::from_slice(&header_bytes).ok()?;
        if header.get("alg").and_then(|a| a.as_str()) != Some("HS256") {
            return None;
        }

        let mut mac = self.mac();
        mac.update(head.as_bytes());
        mac.update(b".");
        mac.update(body.as_bytes());
        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).ok()?;
        // Constant-time comparison under the hood.
        mac.verify_slice(&sig_bytes).ok()?;

        let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(body).ok()?).ok()?;
        if now >= claims.exp {
            return None;
        }
        Some(VerifiedToken {
            subject: claims.sub,
            expires_at: claims.exp,
        })
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }

    // HMAC accepts keys of any length; the expect never fires.
    #[allow(clippy::expect_used)]
    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key length")
    }
}
