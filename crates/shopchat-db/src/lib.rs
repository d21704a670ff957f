pub mod history;
pub mod redis_store;
pub mod sqlite_store;

pub use history::HistoryStore;
pub use redis_store::RedisHistoryStore;
pub use sqlite_store::SqliteHistoryStore;
