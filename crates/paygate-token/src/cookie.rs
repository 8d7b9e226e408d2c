/// Name of the bypass cookie checked on every request.
pub const COOKIE_NAME: &str = "cfpay_jwt";

/// Build the `Set-Cookie` value carrying a bypass token.
pub fn build_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Extract the bypass token from a raw `Cookie` request header, if present.
pub fn extract_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == COOKIE_NAME && !value.is_empty()).then_some(value)
    })
}
