use super::error::PlaybackError;
use super::PlaybackStream;
use crate::domain::audio::{AudioClip, AudioFormat};
use crate::domain::voice::PlaybackOrder;
use crate::infrastructure::repositories::TrackRepository;
use async_trait::async_trait;
use std::sync::Arc;

/// Silence written after every track
pub const SILENCE_GAP_SECS: u32 = 2;

pub struct PlaybackService {
    track_repo: Arc<TrackRepository>,
    playback_order: Arc<PlaybackOrder>,
}

impl PlaybackService {
    pub fn new(track_repo: Arc<TrackRepository>, playback_order: Arc<PlaybackOrder>) -> Self {
        Self {
            track_repo,
            playback_order,
        }
    }
}

#[async_trait]
pub trait PlaybackServiceApi: Send + Sync {
    /// Concatenate the tracks of every phrase into one stream
    ///
    /// For each hash in the given order, every voice track is written in
    /// playback order and followed by a fixed silence gap. All tracks must
    /// share one format; the first track's format is the stream's.
    async fn assemble(&self, hashes: &[String]) -> Result<PlaybackStream, PlaybackError>;
}

#[async_trait]
impl PlaybackServiceApi for PlaybackService {
    async fn assemble(&self, hashes: &[String]) -> Result<PlaybackStream, PlaybackError> {
        if hashes.is_empty() {
            return Err(PlaybackError::Invalid(
                "playback needs at least one phrase".to_string(),
            ));
        }

        // Load and validate everything before writing a single byte
        let clips = self.load_tracks(hashes).await?;
        let format = clips[0].format;

        let gap = format.silence(SILENCE_GAP_SECS);
        let total: usize = clips.iter().map(|c| c.pcm.len() + gap.len()).sum();
        let mut pcm = Vec::with_capacity(total);
        for clip in &clips {
            pcm.extend_from_slice(&clip.pcm);
            pcm.extend_from_slice(&gap);
        }

        let stream = PlaybackStream::from_pcm(format, pcm)
            .map_err(|e| PlaybackError::Dependency(e.to_string()))?;

        tracing::info!(
            phrases = hashes.len(),
            tracks = clips.len(),
            frames = stream.frame_count,
            duration_secs = stream.duration_secs(),
            "Playback assembled"
        );

        Ok(stream)
    }
}

impl PlaybackService {
    async fn load_tracks(&self, hashes: &[String]) -> Result<Vec<AudioClip>, PlaybackError> {
        let mut clips = Vec::with_capacity(hashes.len() * self.playback_order.len());
        let mut batch_format: Option<AudioFormat> = None;

        for hash in hashes {
            for key in self.playback_order.keys() {
                let clip = self.track_repo.get(hash, key).await?;

                match batch_format {
                    None => batch_format = Some(clip.format),
                    Some(expected) if expected != clip.format => {
                        tracing::warn!(
                            hash = %hash,
                            voice = %key,
                            expected = %expected,
                            found = %clip.format,
                            "Track format differs from batch"
                        );
                        return Err(PlaybackError::FormatMismatch {
                            track: format!("{hash}.{key}"),
                            expected,
                            found: clip.format,
                        });
                    }
                    Some(_) => {}
                }

                clips.push(clip);
            }
        }

        Ok(clips)
    }
}
