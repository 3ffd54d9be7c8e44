use crate::domain::phrase::PromptProfile;
use async_trait::async_trait;

/// Repository for language-model text transformations.
/// Abstracts the underlying provider (OpenAI, a local model, etc.)
///
/// Translation, grammar explanation and reading annotation are all one call
/// shape: a prompt profile plus the user text.
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Run `text` through the transformation described by `prompt`
    ///
    /// # Errors
    /// Returns a human-readable description when the provider fails or
    /// returns no content
    async fn complete(&self, prompt: &PromptProfile, text: &str) -> Result<String, String>;
}
