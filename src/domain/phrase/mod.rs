pub mod error;
pub mod focus;
pub mod model;
pub mod prompts;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use error::PhraseServiceError;
pub use focus::FocusedText;
pub use model::{content_hash, is_valid_hash, PhraseIndexEntry, PhraseRecord, SelectionPolicy};
pub use prompts::PromptProfile;
pub use service::{PhraseService, PhraseServiceApi, PhraseSession, MAX_SESSION_LENGTH};

/// Request for POST /api/phrases
#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratePhraseRequest {
    pub text: String,
}

/// Query for GET /api/phrases
#[derive(Debug, Serialize, Deserialize)]
pub struct RetrieveQuery {
    pub policy: Option<SelectionPolicy>,
    pub limit: Option<i64>,
}

/// One phrase as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct PhraseResponse {
    pub hash: String,
    pub text: String,
    pub translations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub reading: String,
    pub created_at: DateTime<Utc>,
}

/// Response for retrieval endpoints: phrases plus their playback
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub phrases: Vec<PhraseResponse>,
    /// WAV data URI; absent when nothing was selected
    pub audio: Option<String>,
    pub duration_secs: Option<f64>,
}

impl From<PhraseRecord> for PhraseResponse {
    fn from(record: PhraseRecord) -> Self {
        Self {
            hash: record.hash,
            text: record.text,
            translations: record.translations,
            explanation: Some(record.explanation).filter(|e| !e.is_empty()),
            reading: record.reading,
            created_at: record.created_at,
        }
    }
}

impl From<PhraseSession> for SessionResponse {
    fn from(session: PhraseSession) -> Self {
        Self {
            audio: session.playback.as_ref().map(|p| p.to_data_uri()),
            duration_secs: session.playback.as_ref().map(|p| p.duration_secs()),
            phrases: session.phrases.into_iter().map(PhraseResponse::from).collect(),
        }
    }
}
