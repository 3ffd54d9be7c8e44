use super::translation_repository::TranslationRepository;
use crate::domain::phrase::PromptProfile;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI chat-completion implementation of the translation repository
pub struct OpenAiTranslationRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTranslationRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    /// System prompt, one-shot examples, then the user text
    fn build_messages(
        prompt: &PromptProfile,
        text: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2 + prompt.examples.len() * 2);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.as_str())
                .build()?
                .into(),
        );

        for (user, assistant) in &prompt.examples {
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user.as_str())
                    .build()?
                    .into(),
            );
            messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(assistant.as_str())
                    .build()?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()?
                .into(),
        );

        Ok(messages)
    }
}

#[async_trait]
impl TranslationRepository for OpenAiTranslationRepository {
    async fn complete(&self, prompt: &PromptProfile, text: &str) -> Result<String, String> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            prompt = %prompt.name,
            text_length = text.len(),
            "Calling OpenAI chat completion"
        );

        let messages = Self::build_messages(prompt, text)
            .map_err(|e| format!("OpenAI request build error: {}", e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .build()
            .map_err(|e| format!("OpenAI request build error: {}", e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                prompt = %prompt.name,
                "OpenAI chat completion failed"
            );
            format!("OpenAI error: {}", e)
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| format!("OpenAI returned no content for {}", prompt.name))?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            prompt = %prompt.name,
            latency_ms = start_time.elapsed().as_millis(),
            response_length = content.len(),
            "Chat completion finished"
        );

        Ok(content)
    }
}
