use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds shared by every shopchat crate.
///
/// Each variant carries the message of the underlying cause so the boundary
/// layer can render it without losing detail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("HTTP error occurred: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("history store error: {0}")]
    Store(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable label used in logs and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::AuthFailure(_) => "auth_failure",
            Error::UpstreamUnavailable(_) => "upstream_unavailable",
            Error::UpstreamStatus { .. } => "upstream_status",
            Error::Upstream(_) => "upstream",
            Error::Timeout(_) => "timeout",
            Error::MalformedPayload(_) => "malformed_payload",
            Error::Store(_) => "store",
            Error::Channel(_) => "channel",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(feature = "http")]
impl Error {
    /// Classify a transport-level `reqwest` failure.
    pub fn from_request(context: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(format!("{context}: {e}"))
        } else if e.is_connect() {
            Error::UpstreamUnavailable(format!("{context}: {e}"))
        } else if e.is_decode() {
            Error::MalformedPayload(format!("{context}: {e}"))
        } else {
            Error::Upstream(format!("{context}: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_display_contains_code() {
        let err = Error::UpstreamStatus {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error occurred: 503 - overloaded");
        assert_eq!(err.kind(), "upstream_status");
    }

    #[test]
    fn serde_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.kind(), "serialization");
    }
}
