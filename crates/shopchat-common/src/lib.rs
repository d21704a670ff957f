pub mod error;
pub mod prompt;
pub mod turn;

pub use error::{Error, Result};
pub use turn::{ConversationTurn, TurnRole};
