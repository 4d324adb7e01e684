use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
/// Use this for comparing the admin API key
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check an `Authorization: Bearer <token>` header value against the key.
pub fn bearer_matches(header: Option<&str>, key: &str) -> bool {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| constant_time_compare(token.trim(), key))
        .unwrap_or(false)
}
