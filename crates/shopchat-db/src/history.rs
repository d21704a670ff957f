use async_trait::async_trait;
use shopchat_common::{ConversationTurn, Result};
use tracing::warn;

/// Durable, append-only per-user conversation history.
///
/// Implementations keep turns in insertion order. `read_all` followed by
/// `append_many` is not atomic across callers; serialize per user if ordering
/// under concurrency matters.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Backend identifier (e.g. "redis", "sqlite").
    fn backend(&self) -> &str;

    /// Push a turn to the tail of the user's history.
    async fn append(&self, user_id: &str, turn: &ConversationTurn) -> Result<()>;

    /// Push several turns in order. Either all of them are stored or none are.
    async fn append_many(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()>;

    /// Every stored turn for the user, oldest first. Empty when the user is unknown.
    async fn read_all(&self, user_id: &str) -> Result<Vec<ConversationTurn>>;

    /// Drop all but the newest `keep_last` turns. Returns how many were removed.
    async fn trim(&self, user_id: &str, keep_last: usize) -> Result<usize>;

    /// Check that the backing store answers.
    async fn health_check(&self) -> Result<bool>;
}

/// Parse stored lines, skipping any that do not carry a known role label.
pub(crate) fn parse_lines(user_id: &str, lines: Vec<String>) -> Vec<ConversationTurn> {
    lines
        .into_iter()
        .filter_map(|line| match line.parse::<ConversationTurn>() {
            Ok(turn) => Some(turn),
            Err(e) => {
                warn!("skipping unreadable history line for {user_id}: {e}");
                None
            }
        })
        .collect()
}
