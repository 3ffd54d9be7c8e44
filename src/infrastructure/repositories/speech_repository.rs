use crate::domain::audio::AudioClip;
use crate::domain::voice::VoiceProfile;
use async_trait::async_trait;

/// Repository for speech synthesis.
/// Abstracts the underlying TTS provider (AWS Polly, OpenAI, etc.)
///
/// Implementations are responsible for:
/// - Building the provider request for the voice (see `build_ssml`)
/// - Returning raw PCM with its format, never a compressed container
/// - Collapsing provider-specific failure reasons into one message
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Synthesize `text` with `voice`
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, String>;
}
