//! Generative text service trait.

use async_trait::async_trait;

use crate::error::Result;

/// A chat-style text generation backend.
///
/// Used by [`LlmQueryTranslator`](crate::translate::LlmQueryTranslator) and
/// by downstream prompt-construction code that turns retrieved context into
/// teaching material.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a reply to `user_message` under `system_instruction`.
    async fn generate(&self, system_instruction: &str, user_message: &str) -> Result<String>;
}
