use std::sync::Arc;

use shopchat_catalog::{Catalog, CatalogSource};
use shopchat_common::{ConversationTurn, Result};
use shopchat_db::HistoryStore;
use tracing::{info, instrument, warn};

use crate::conversation::{
    CATALOG_UNAVAILABLE, ConversationAssembler, DEFAULT_PERSONA, shopping_prompt,
};
use crate::locks::UserLocks;
use crate::providers::{LlmProvider, LlmRequest};

/// Reachability of the upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamHealth {
    pub catalog: bool,
    pub inference: bool,
}

/// The query pipeline: history → context → catalog → inference → history.
pub struct ChatRuntime {
    catalog: Arc<dyn CatalogSource>,
    provider: Arc<dyn LlmProvider>,
    history: Arc<dyn HistoryStore>,
    assembler: ConversationAssembler,
    persona: String,
    model: String,
    max_turns: Option<usize>,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
    locks: Option<UserLocks>,
}

impl ChatRuntime {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        provider: Arc<dyn LlmProvider>,
        history: Arc<dyn HistoryStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            provider,
            history,
            assembler: ConversationAssembler::default(),
            persona: DEFAULT_PERSONA.to_string(),
            model: model.into(),
            max_turns: None,
            temperature: None,
            max_output_tokens: None,
            locks: Some(UserLocks::new()),
        }
    }

    pub fn with_assembler(mut self, assembler: ConversationAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Keep only the newest `max_turns` turns per user. `None` keeps everything.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Generation settings passed with every inference request.
    pub fn with_generation(
        mut self,
        temperature: Option<f64>,
        max_output_tokens: Option<u32>,
    ) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Toggle per-user serialization of `process_query`.
    pub fn with_user_serialization(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(UserLocks::new);
        self
    }

    pub fn history_backend(&self) -> &str {
        self.history.backend()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer a user's query and record both turns in their history.
    ///
    /// The User and AI turns are stored together; nothing is appended when
    /// inference or the store write fails.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn process_query(&self, user_id: &str, query: &str) -> Result<String> {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(user_id).await),
            None => None,
        };

        let history = self.history.read_all(user_id).await?;
        let context = self.assembler.build_context(&history, query);

        let catalog_text = match self.catalog.fetch_available_products().await {
            Ok(catalog) => catalog.to_prompt_text(),
            Err(e) => {
                warn!("catalog fetch failed, continuing without products: {e}");
                CATALOG_UNAVAILABLE.to_string()
            }
        };

        let prompt = shopping_prompt(&self.persona, &catalog_text, &context);
        let mut request = LlmRequest::new(self.model.clone(), prompt);
        request.temperature = self.temperature;
        request.max_output_tokens = self.max_output_tokens;
        let response = self.provider.complete(&request).await?;

        self.history
            .append_many(
                user_id,
                &[
                    ConversationTurn::user(query),
                    ConversationTurn::ai(response.text.clone()),
                ],
            )
            .await?;

        if let Some(max_turns) = self.max_turns {
            match self.history.trim(user_id, max_turns).await {
                Ok(0) => {}
                Ok(removed) => info!("trimmed {removed} old turns"),
                Err(e) => warn!("failed to trim history: {e}"),
            }
        }

        Ok(response.text)
    }

    pub async fn available_products(&self) -> Result<Catalog> {
        self.catalog.fetch_available_products().await
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        self.history.read_all(user_id).await
    }

    /// Check catalog and inference concurrently. Errors count as unreachable.
    pub async fn upstream_health(&self) -> UpstreamHealth {
        let (catalog, inference) =
            tokio::join!(self.catalog.health_check(), self.provider.health_check());
        UpstreamHealth {
            catalog: catalog.unwrap_or(false),
            inference: inference.unwrap_or(false),
        }
    }
}
