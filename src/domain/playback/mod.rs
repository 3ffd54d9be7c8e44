pub mod error;
pub mod service;

use crate::domain::audio::{AudioClip, AudioError, AudioFormat};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub use error::PlaybackError;
pub use service::{PlaybackService, PlaybackServiceApi, SILENCE_GAP_SECS};

/// An assembled session, already wrapped in a WAV container
#[derive(Debug, Clone)]
pub struct PlaybackStream {
    pub format: AudioFormat,
    pub frame_count: usize,
    pub wav: Vec<u8>,
}

impl PlaybackStream {
    pub fn from_pcm(format: AudioFormat, pcm: Vec<u8>) -> Result<Self, AudioError> {
        let clip = AudioClip::new(format, pcm)?;
        Ok(Self {
            format,
            frame_count: clip.frame_count(),
            wav: clip.to_wav()?,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.format.sample_rate as f64
    }

    /// `data:audio/wav;base64,...` for embedding in a response
    pub fn to_data_uri(&self) -> String {
        format!("data:audio/wav;base64,{}", BASE64.encode(&self.wav))
    }
}
