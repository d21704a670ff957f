pub mod redaction;
pub mod verify;

pub use redaction::{RedactingWriter, redact_secrets};
pub use verify::{constant_time_eq, verify_token_matches};
