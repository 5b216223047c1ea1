//! Parley Common - shared types for the intent service.
//!
//! Keyword intent classification, the interaction record, the AI fallback
//! client and the interaction store, plus the wire schemas used by both the
//! daemon and the CLI.

pub mod intent;
pub mod interaction;
pub mod llm_client;
pub mod schemas;
pub mod store;

pub use intent::{classify_intent, Intent};
pub use interaction::Interaction;
pub use llm_client::{
    FakeFallbackClient, FallbackClient, FallbackError, HttpFallbackClient, LlmConfig,
};
pub use schemas::*;
pub use store::{
    Ack, InteractionStore, MemoryInteractionStore, SqliteInteractionStore, StoreError,
};
