use crate::domain::audio::AudioClip;
use crate::error::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// One WAV file per (phrase hash, voice key) under a single directory
pub struct TrackRepository {
    tracks_dir: PathBuf,
}

impl TrackRepository {
    pub fn new(tracks_dir: PathBuf) -> Self {
        Self { tracks_dir }
    }

    pub async fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.tracks_dir).await?;
        Ok(())
    }

    /// Store a track, replacing the file atomically.
    ///
    /// Replacing an existing track with one of a different format is refused.
    pub async fn put(&self, hash: &str, voice: &str, clip: &AudioClip) -> AppResult<()> {
        let path = self.track_path(hash, voice)?;
        let wav = clip
            .to_wav()
            .map_err(|e| AppError::BadRequest(format!("track {hash}.{voice}: {e}")))?;

        match self.get(hash, voice).await {
            Ok(existing) if existing.format != clip.format => {
                return Err(AppError::BadRequest(format!(
                    "track {hash}.{voice} already stored as {}, refusing {}",
                    existing.format, clip.format
                )));
            }
            Ok(_) => {
                tracing::warn!(hash = %hash, voice = %voice, "Overwriting existing track");
            }
            Err(AppError::NotFound(_)) => {}
            // A torn leftover gets replaced
            Err(AppError::CorruptTrack(_)) => {}
            Err(e) => return Err(e),
        }

        write_atomic(&path, &wav).await?;

        tracing::debug!(
            hash = %hash,
            voice = %voice,
            frames = clip.frame_count(),
            bytes = wav.len(),
            "Track stored"
        );

        Ok(())
    }

    pub async fn get(&self, hash: &str, voice: &str) -> AppResult<AudioClip> {
        let path = self.track_path(hash, voice)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("track {hash}.{voice}")));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        AudioClip::from_wav(&bytes).map_err(|e| {
            tracing::error!(
                hash = %hash,
                voice = %voice,
                error = %e,
                "Stored track could not be decoded"
            );
            AppError::CorruptTrack(format!("{hash}.{voice}: {e}"))
        })
    }

    pub async fn exists(&self, hash: &str, voice: &str) -> AppResult<bool> {
        let path = self.track_path(hash, voice)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Remove a track; returns whether a file was there
    pub async fn remove(&self, hash: &str, voice: &str) -> AppResult<bool> {
        let path = self.track_path(hash, voice)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn track_path(&self, hash: &str, voice: &str) -> AppResult<PathBuf> {
        for part in [hash, voice] {
            if !is_safe_component(part) {
                return Err(AppError::BadRequest(format!(
                    "invalid track key component: {part:?}"
                )));
            }
        }
        Ok(self.tracks_dir.join(format!("{hash}.{voice}.wav")))
    }
}

fn is_safe_component(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Write to a sibling temp file, fsync, then rename over `path`
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> AppResult<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Internal(format!("not a file path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    let result = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(AppError::Io(e));
    }

    Ok(())
}
