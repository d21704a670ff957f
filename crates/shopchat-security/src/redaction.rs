use std::sync::LazyLock;

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

/// A writer that masks credentials (API keys, access tokens) in log output.
pub struct RedactingWriter<W> {
    inner: W,
}

impl RedactingWriter<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self {
            inner: std::io::stderr(),
        }
    }
}

impl<W: std::io::Write> std::io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let original = String::from_utf8_lossy(buf);
        let redacted = redact_secrets(&original);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl<'a> MakeWriter<'a> for RedactingWriter<std::io::Stderr> {
    type Writer = RedactingWriter<std::io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::stderr()
    }
}

static TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
          AIza[0-9A-Za-z_\-]{20,}        # Google API keys
        | EAA[0-9A-Za-z]{20,}            # Meta Graph access tokens
        | Bearer\s+[0-9A-Za-z._\-]{16,}  # bearer headers
        ",
    )
    .expect("redaction regex should compile")
});

// `?key=` on Gemini URLs and `api_key` values echoed by request errors.
static KEY_PARAMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([?&](?:key|api_key|access_token)=)[^&\s]+")
        .expect("query redaction regex should compile")
});

/// Replace known credential patterns with `[REDACTED]`.
pub fn redact_secrets(input: &str) -> String {
    let masked = TOKENS.replace_all(input, "[REDACTED]");
    KEY_PARAMS
        .replace_all(&masked, "${1}[REDACTED]")
        .into_owned()
}
