use shopchat_common::ConversationTurn;
pub use shopchat_common::prompt::{DEFAULT_INSTRUCTION, DEFAULT_PERSONA};

/// Placed in the prompt when the catalog could not be fetched for a query.
pub const CATALOG_UNAVAILABLE: &str = "Product catalog is currently unavailable.";

/// Builds the conversation context sent to the model.
#[derive(Debug, Clone)]
pub struct ConversationAssembler {
    instruction: String,
}

impl Default for ConversationAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION)
    }
}

impl ConversationAssembler {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// `<instruction><turn_1>\n...<turn_n>\nUser: <query>`
    ///
    /// The instruction is followed directly by the first turn with no separator.
    pub fn build_context(&self, history: &[ConversationTurn], query: &str) -> String {
        let turns = history
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}{turns}\nUser: {query}", self.instruction)
    }
}

/// Wrap a conversation context with the catalog for the shopping assistant.
pub fn shopping_prompt(persona: &str, catalog_text: &str, context: &str) -> String {
    format!(
        "{persona} Based on this product catalog:\n{catalog_text}\n\n\
         Please answer this customer question: {context}\n\
         Provide specific product details when relevant."
    )
}
