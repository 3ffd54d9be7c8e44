use crate::domain::playback::PlaybackError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PhraseServiceError {
    #[error("phrase already exists: {0}")]
    Duplicate(String),
    #[error("translation failed: {0}")]
    TranslationFailed(String),
    #[error("explanation failed: {0}")]
    ExplainFailed(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("phrase not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<AppError> for PhraseServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::DuplicatePhrase(hash) => PhraseServiceError::Duplicate(hash),
            AppError::NotFound(msg) => PhraseServiceError::NotFound(msg),
            AppError::BadRequest(msg) => PhraseServiceError::Invalid(msg),
            _ => PhraseServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<PhraseServiceError> for AppError {
    fn from(err: PhraseServiceError) -> Self {
        match err {
            PhraseServiceError::Duplicate(hash) => AppError::DuplicatePhrase(hash),
            PhraseServiceError::TranslationFailed(msg) => AppError::TranslationFailed(msg),
            PhraseServiceError::ExplainFailed(msg) => AppError::ExplainFailed(msg),
            PhraseServiceError::SynthesisFailed(msg) => AppError::SynthesisFailed(msg),
            PhraseServiceError::NotFound(msg) => AppError::NotFound(msg),
            PhraseServiceError::Invalid(msg) => AppError::BadRequest(msg),
            PhraseServiceError::Playback(e) => AppError::from(e),
            PhraseServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
