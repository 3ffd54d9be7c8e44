use crate::domain::audio::AudioFormat;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("track not found: {0}")]
    NotFound(String),
    #[error("track {track} is {found}, batch is {expected}")]
    FormatMismatch {
        track: String,
        expected: AudioFormat,
        found: AudioFormat,
    },
    #[error("corrupt track: {0}")]
    CorruptTrack(String),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<AppError> for PlaybackError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(msg) => PlaybackError::NotFound(msg),
            AppError::CorruptTrack(msg) => PlaybackError::CorruptTrack(msg),
            AppError::BadRequest(msg) => PlaybackError::Invalid(msg),
            _ => PlaybackError::Dependency(err.to_string()),
        }
    }
}

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Invalid(msg) => AppError::BadRequest(msg),
            PlaybackError::NotFound(msg) => AppError::NotFound(msg),
            PlaybackError::FormatMismatch { .. } => AppError::FormatMismatch(err.to_string()),
            PlaybackError::CorruptTrack(msg) => AppError::CorruptTrack(msg),
            PlaybackError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
