use super::speech_repository::SpeechRepository;
use crate::domain::audio::{AudioClip, AudioFormat};
use crate::domain::voice::{build_ssml, VoiceProfile};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, TextType, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// Polly's raw PCM output is signed 16-bit little-endian mono
const PCM_SAMPLE_RATE: u32 = 16000;
const PCM_CHANNELS: u16 = 1;
const PCM_SAMPLE_WIDTH: u16 = 2;

/// AWS Polly implementation of the speech repository
pub struct PollySpeechRepository {
    polly_client: Arc<PollyClient>,
}

impl PollySpeechRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    pub fn output_format() -> AudioFormat {
        AudioFormat::new(PCM_SAMPLE_RATE, PCM_CHANNELS, PCM_SAMPLE_WIDTH)
    }
}

#[async_trait]
impl SpeechRepository for PollySpeechRepository {
    async fn synthesize(&self, text: &str, voice: &VoiceProfile) -> Result<AudioClip, String> {
        let start_time = std::time::Instant::now();
        let ssml = build_ssml(text, voice);
        let voice_id = VoiceId::from(voice.vendor_voice.as_str());
        let engine = Engine::Neural;

        tracing::info!(
            voice = %voice.key,
            voice_id = ?voice_id,
            engine = ?engine,
            output_format = "Pcm",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(ssml)
            .text_type(TextType::Ssml)
            .voice_id(voice_id)
            .output_format(OutputFormat::Pcm)
            .sample_rate(PCM_SAMPLE_RATE.to_string())
            .engine(engine)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    voice = %voice.key,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                format!("AWS Polly error: {}", e)
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            format!("Failed to read audio stream: {}", e)
        })?;

        let pcm = audio_stream.into_bytes().to_vec();
        let clip = AudioClip::new(Self::output_format(), pcm)
            .map_err(|e| format!("AWS Polly returned unusable audio: {}", e))?;

        tracing::info!(
            provider = "polly",
            voice = %voice.key,
            latency_ms = start_time.elapsed().as_millis(),
            frames = clip.frame_count(),
            duration_secs = clip.duration_secs(),
            "TTS synthesis completed"
        );

        Ok(clip)
    }
}
