use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use shopchat_common::{ConversationTurn, Error, Result};
use tracing::{error, info};

use crate::history::{HistoryStore, parse_lines};

pub const DEFAULT_KEY_PREFIX: &str = "chat_history";

/// Conversation history kept in Redis lists, one list per user.
#[derive(Clone)]
pub struct RedisHistoryStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisHistoryStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::Config(format!("invalid redis url: {e}")))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Store(format!("failed to connect to redis: {e}")))?;

        let mut health_connection = connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut health_connection)
            .await
            .map_err(|e| Error::Store(format!("failed to connect to redis: {e}")))?;

        info!("history store connected to redis");
        Ok(Self {
            connection,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        })
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, user_id: &str) -> String {
        history_key(&self.key_prefix, user_id)
    }
}

fn history_key(prefix: &str, user_id: &str) -> String {
    format!("{prefix}:{user_id}")
}

fn store_err(action: &str, e: redis::RedisError) -> Error {
    Error::Store(format!("failed to {action}: {e}"))
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    fn backend(&self) -> &str {
        "redis"
    }

    async fn append(&self, user_id: &str, turn: &ConversationTurn) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: i64 = connection
            .rpush(self.key(user_id), turn.to_string())
            .await
            .map_err(|e| store_err("append turn", e))?;
        Ok(())
    }

    async fn append_many(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        // A single RPUSH with every value is atomic.
        let lines: Vec<String> = turns.iter().map(ToString::to_string).collect();
        let mut connection = self.connection.clone();
        let _: i64 = connection
            .rpush(self.key(user_id), lines)
            .await
            .map_err(|e| store_err("append turns", e))?;
        Ok(())
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let mut connection = self.connection.clone();
        let lines: Vec<String> = connection
            .lrange(self.key(user_id), 0, -1)
            .await
            .map_err(|e| store_err("load history", e))?;
        Ok(parse_lines(user_id, lines))
    }

    async fn trim(&self, user_id: &str, keep_last: usize) -> Result<usize> {
        let key = self.key(user_id);
        let mut connection = self.connection.clone();

        let before: i64 = connection
            .llen(&key)
            .await
            .map_err(|e| store_err("measure history", e))?;
        let keep = i64::try_from(keep_last).unwrap_or(i64::MAX);
        if before <= keep {
            return Ok(0);
        }

        if keep == 0 {
            let _: i64 = connection
                .del(&key)
                .await
                .map_err(|e| store_err("trim history", e))?;
        } else {
            let start = isize::try_from(-keep).unwrap_or(isize::MIN);
            let _: () = connection
                .ltrim(&key, start, -1)
                .await
                .map_err(|e| store_err("trim history", e))?;
        }
        Ok((before - keep) as usize)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut connection = self.connection.clone();
        match redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                error!("redis health check failed: {e}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_prefixed_by_user() {
        assert_eq!(history_key(DEFAULT_KEY_PREFIX, "15551234"), "chat_history:15551234");
        assert_eq!(history_key("shop", "u1"), "shop:u1");
    }

    #[tokio::test]
    async fn invalid_url_is_config_error() {
        let err = RedisHistoryStore::connect("not a url").await.err().unwrap();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    // Needs a live server: REDIS_URL=redis://localhost:6379/15 cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn round_trip_against_live_redis() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/15".into());
        let store = RedisHistoryStore::connect(&url)
            .await
            .unwrap()
            .with_key_prefix("shopchat_test");
        let user = format!("user-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0));

        for i in 0..5 {
            store
                .append(&user, &ConversationTurn::user(format!("q{i}")))
                .await
                .unwrap();
        }
        store
            .append_many(
                &user,
                &[ConversationTurn::user("q5"), ConversationTurn::ai("a5")],
            )
            .await
            .unwrap();
        assert_eq!(store.trim(&user, 2).await.unwrap(), 5);

        let turns = store.read_all(&user).await.unwrap();
        assert_eq!(turns, vec![ConversationTurn::user("q5"), ConversationTurn::ai("a5")]);
        store.trim(&user, 0).await.unwrap();
    }
}
