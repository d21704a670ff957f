pub mod conversation;
pub mod gemini;
pub mod locks;
pub mod providers;
pub mod runtime;

pub use conversation::{CATALOG_UNAVAILABLE, ConversationAssembler, shopping_prompt};
pub use gemini::GeminiProvider;
pub use locks::{UserGuard, UserLocks};
pub use providers::{LlmProvider, LlmRequest, LlmResponse, Usage};
pub use runtime::ChatRuntime;
