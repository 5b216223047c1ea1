//! Process pipeline: classify, optionally ask the AI fallback, persist.
//!
//! Linear flow with two early exits. A fallback failure aborts before
//! anything is written; a store failure discards any AI reply already
//! obtained.

use crate::error::ProcessError;
use parley_common::{
    classify_intent, FallbackClient, Interaction, InteractionStore, ProcessResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Request handler with its two injected dependencies
#[derive(Clone)]
pub struct InteractionHandler {
    fallback: Arc<dyn FallbackClient>,
    store: Arc<dyn InteractionStore>,
}

impl InteractionHandler {
    pub fn new(fallback: Arc<dyn FallbackClient>, store: Arc<dyn InteractionStore>) -> Self {
        Self { fallback, store }
    }

    pub fn store(&self) -> &Arc<dyn InteractionStore> {
        &self.store
    }

    /// Run the full pipeline for one utterance
    pub async fn handle(&self, text: &str) -> Result<ProcessResponse, ProcessError> {
        let intent = classify_intent(text);
        debug!("Classified {:?} as {}", text, intent);

        let ai_response = if intent.needs_fallback() {
            info!("No intent matched, asking AI fallback");
            let reply = self.fallback.reply(text).await.map_err(|e| {
                error!("AI fallback failed: {}", e);
                e
            })?;
            Some(reply)
        } else {
            None
        };

        let record = Interaction::new(text, intent, ai_response.clone());
        let ack = self.store.append(&record).await.map_err(|e| {
            error!("Failed to store interaction: {}", e);
            e
        })?;
        debug!("Interaction {} stored", ack.id);

        Ok(ProcessResponse::new(intent, ai_response))
    }
}
