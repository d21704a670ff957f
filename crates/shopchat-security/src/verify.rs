use tracing::warn;

/// Compare two secrets without short-circuiting on the first differing byte.
pub fn constant_time_eq(left: &str, right: &str) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut diff = 0_u8;
    for (lhs, rhs) in left.as_bytes().iter().zip(right.as_bytes().iter()) {
        diff |= lhs ^ rhs;
    }

    diff == 0
}

/// Check a webhook subscription token against the configured one.
///
/// An unset or empty configured token rejects every request.
pub fn verify_token_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|t| !t.is_empty()) else {
        warn!("webhook verification attempted but no verify token is configured");
        return false;
    };
    provided.is_some_and(|provided| constant_time_eq(expected, provided))
}
