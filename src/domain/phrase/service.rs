use super::error::PhraseServiceError;
use super::focus::FocusedText;
use super::model::{content_hash, is_valid_hash, PhraseRecord, SelectionPolicy};
use super::prompts::{grammar_request, PromptProfile};
use crate::domain::audio::AudioClip;
use crate::domain::playback::{PlaybackService, PlaybackServiceApi, PlaybackStream};
use crate::domain::voice::{PlaybackOrder, TextSource};
use crate::infrastructure::repositories::{
    PhraseIndexRepository, PhraseLogRepository, SpeechRepository, TrackRepository,
    TranslationRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on phrases in one retrieval session
pub const MAX_SESSION_LENGTH: i64 = 20;

/// Phrases selected for one playback session, with their audio
#[derive(Debug, Clone)]
pub struct PhraseSession {
    pub phrases: Vec<PhraseRecord>,
    /// `None` only when nothing was selected
    pub playback: Option<PlaybackStream>,
}

pub struct PhraseService {
    index_repo: Arc<PhraseIndexRepository>,
    log_repo: Arc<PhraseLogRepository>,
    track_repo: Arc<TrackRepository>,
    translation_repo: Arc<dyn TranslationRepository>,
    speech_repo: Arc<dyn SpeechRepository>,
    playback_service: Arc<PlaybackService>,
    playback_order: Arc<PlaybackOrder>,
    call_timeout: Duration,
}

impl PhraseService {
    pub fn new(
        index_repo: Arc<PhraseIndexRepository>,
        log_repo: Arc<PhraseLogRepository>,
        track_repo: Arc<TrackRepository>,
        translation_repo: Arc<dyn TranslationRepository>,
        speech_repo: Arc<dyn SpeechRepository>,
        playback_service: Arc<PlaybackService>,
        playback_order: Arc<PlaybackOrder>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            index_repo,
            log_repo,
            track_repo,
            translation_repo,
            speech_repo,
            playback_service,
            playback_order,
            call_timeout,
        }
    }
}

#[async_trait]
pub trait PhraseServiceApi: Send + Sync {
    /// Generate and store study material for a new phrase
    ///
    /// This operation:
    /// - Explains the `{{focus}}` term, if any
    /// - Translates into every target language and annotates the reading
    /// - Synthesizes one track per voice in playback order
    /// - Commits index row, tracks and log record, or nothing at all
    ///
    /// A phrase whose cleaned text was already generated yields `Duplicate`.
    async fn generate(&self, text: String) -> Result<PhraseRecord, PhraseServiceError>;

    /// Select phrases by policy (bumping their usage) and assemble their playback
    async fn retrieve(
        &self,
        policy: SelectionPolicy,
        limit: i64,
    ) -> Result<PhraseSession, PhraseServiceError>;

    /// One random phrase; `NotFound` when the store is empty
    async fn random(&self) -> Result<PhraseSession, PhraseServiceError>;

    /// One phrase by hash, without touching its usage count
    async fn find(&self, hash: &str) -> Result<PhraseSession, PhraseServiceError>;

    /// Remove a phrase from retrieval. The log keeps its history.
    async fn delete(&self, hash: &str) -> Result<(), PhraseServiceError>;
}

#[async_trait]
impl PhraseServiceApi for PhraseService {
    async fn generate(&self, text: String) -> Result<PhraseRecord, PhraseServiceError> {
        tracing::info!(text_length = text.len(), "Phrase generation request");

        let focused = FocusedText::parse(&text);
        if focused.text.is_empty() {
            return Err(PhraseServiceError::Invalid(
                "Phrase text cannot be empty".to_string(),
            ));
        }

        // 1. Explain the focus term, if any
        let explanation = match &focused.focus {
            Some(term) => self.explain(term, &focused.text).await?,
            None => String::new(),
        };

        // 2-3. Translate the cleaned text into every target language
        let mut translations = BTreeMap::new();
        for language in self.playback_order.target_languages() {
            let translated = self.translate(&focused.text, &language).await?;
            translations.insert(language, translated);
        }

        // 4. Reading annotation
        let reading = self.annotate_reading(&focused.text).await?;

        // 5. Content hash; skip synthesis for phrases already known
        let hash = content_hash(&focused.text);
        if self.index_repo.find(&hash).await?.is_some() {
            tracing::info!(hash = %hash, "Phrase already generated");
            return Err(PhraseServiceError::Duplicate(hash));
        }

        // 6. One track per voice
        let tracks = self.synthesize_tracks(&focused.text, &translations).await?;

        // 7. Commit
        let record = PhraseRecord {
            hash,
            text: focused.text,
            translations,
            explanation,
            reading,
            created_at: Utc::now(),
        };
        self.commit(&record, &tracks).await?;

        tracing::info!(
            hash = %record.hash,
            tracks = tracks.len(),
            has_explanation = !record.explanation.is_empty(),
            "Phrase generated"
        );

        Ok(record)
    }

    async fn retrieve(
        &self,
        policy: SelectionPolicy,
        limit: i64,
    ) -> Result<PhraseSession, PhraseServiceError> {
        let limit = limit.clamp(1, MAX_SESSION_LENGTH);
        let entries = self.index_repo.select_ranked(policy, limit).await?;

        if entries.is_empty() {
            tracing::info!(policy = %policy, "No phrases to retrieve");
            return Ok(PhraseSession {
                phrases: Vec::new(),
                playback: None,
            });
        }

        let hashes: Vec<String> = entries.into_iter().map(|e| e.hash).collect();
        let phrases = self.resolve_records(&hashes).await?;
        let playback = self.playback_service.assemble(&hashes).await?;

        tracing::info!(
            policy = %policy,
            phrases = phrases.len(),
            duration_secs = playback.duration_secs(),
            "Phrases retrieved"
        );

        Ok(PhraseSession {
            phrases,
            playback: Some(playback),
        })
    }

    async fn random(&self) -> Result<PhraseSession, PhraseServiceError> {
        let session = self.retrieve(SelectionPolicy::Random, 1).await?;
        if session.phrases.is_empty() {
            return Err(PhraseServiceError::NotFound(
                "no phrases have been generated yet".to_string(),
            ));
        }
        Ok(session)
    }

    async fn find(&self, hash: &str) -> Result<PhraseSession, PhraseServiceError> {
        self.validate_hash(hash)?;

        match self.index_repo.find(hash).await? {
            Some(entry) if entry.complete => {}
            _ => return Err(PhraseServiceError::NotFound(hash.to_string())),
        }

        let hashes = vec![hash.to_string()];
        let phrases = self.resolve_records(&hashes).await?;
        let playback = self.playback_service.assemble(&hashes).await?;

        Ok(PhraseSession {
            phrases,
            playback: Some(playback),
        })
    }

    async fn delete(&self, hash: &str) -> Result<(), PhraseServiceError> {
        self.validate_hash(hash)?;

        // The retired row keeps the dedup gate closed until the tracks are gone
        if !self.index_repo.retire(hash).await? {
            return Err(PhraseServiceError::NotFound(hash.to_string()));
        }

        // The log record stays as history
        self.remove_tracks(hash).await;
        self.index_repo.delete(hash).await?;

        tracing::info!(hash = %hash, "Phrase deleted");
        Ok(())
    }
}

impl PhraseService {
    fn validate_hash(&self, hash: &str) -> Result<(), PhraseServiceError> {
        if !is_valid_hash(hash) {
            return Err(PhraseServiceError::Invalid(format!("malformed phrase hash: {hash}")));
        }
        Ok(())
    }

    /// Bound an external call; a timeout counts as that call failing
    async fn bounded<T, F>(&self, call_name: &str, call: F) -> Result<T, String>
    where
        F: Future<Output = Result<T, String>> + Send,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(format!(
                "timed out after {:.1}s",
                self.call_timeout.as_secs_f64()
            )),
        };

        tracing::debug!(
            call = %call_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "External call finished"
        );

        result
    }

    async fn explain(&self, term: &str, sentence: &str) -> Result<String, PhraseServiceError> {
        let prompt = PromptProfile::grammar();
        let request = grammar_request(term, sentence);
        self.bounded(&prompt.name, self.translation_repo.complete(&prompt, &request))
            .await
            .map_err(|e| {
                tracing::error!(term = %term, error = %e, "Grammar explanation failed");
                PhraseServiceError::ExplainFailed(e)
            })
    }

    async fn translate(&self, text: &str, language: &str) -> Result<String, PhraseServiceError> {
        let prompt = PromptProfile::translation(language);
        self.bounded(&prompt.name, self.translation_repo.complete(&prompt, text))
            .await
            .map_err(|e| {
                tracing::error!(language = %language, error = %e, "Translation failed");
                PhraseServiceError::TranslationFailed(format!("{language}: {e}"))
            })
    }

    async fn annotate_reading(&self, text: &str) -> Result<String, PhraseServiceError> {
        let prompt = PromptProfile::reading();
        self.bounded(&prompt.name, self.translation_repo.complete(&prompt, text))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Reading annotation failed");
                PhraseServiceError::TranslationFailed(format!("reading: {e}"))
            })
    }

    async fn synthesize_tracks(
        &self,
        text: &str,
        translations: &BTreeMap<String, String>,
    ) -> Result<Vec<(String, AudioClip)>, PhraseServiceError> {
        let mut tracks = Vec::with_capacity(self.playback_order.len());

        for voice in self.playback_order.voices() {
            let spoken = match &voice.text_source {
                TextSource::Source => text,
                TextSource::Translation(language) => {
                    translations.get(language).map(String::as_str).ok_or_else(|| {
                        PhraseServiceError::TranslationFailed(format!(
                            "no {language} translation for voice {}",
                            voice.key
                        ))
                    })?
                }
            };

            let clip = self
                .bounded(&voice.key, self.speech_repo.synthesize(spoken, voice))
                .await
                .and_then(|clip| clip.validate().map(|_| clip).map_err(|e| e.to_string()))
                .map_err(|e| {
                    tracing::error!(voice = %voice.key, error = %e, "Synthesis failed");
                    PhraseServiceError::SynthesisFailed(format!("{}: {e}", voice.key))
                })?;

            tracing::debug!(
                voice = %voice.key,
                frames = clip.frame_count(),
                "Voice synthesized"
            );
            tracks.push((voice.key.clone(), clip));
        }

        Ok(tracks)
    }

    /// Dedup gate first, then tracks and log, then visibility.
    /// Anything failing after the gate is rolled back.
    async fn commit(
        &self,
        record: &PhraseRecord,
        tracks: &[(String, AudioClip)],
    ) -> Result<(), PhraseServiceError> {
        self.index_repo.insert(&record.hash, record.created_at).await?;

        let persisted = async {
            for (key, clip) in tracks {
                self.track_repo.put(&record.hash, key, clip).await?;
            }
            self.log_repo.append(record).await?;
            self.index_repo.mark_complete(&record.hash).await
        }
        .await;

        if let Err(e) = persisted {
            tracing::error!(
                hash = %record.hash,
                error = %e,
                "Commit failed, rolling back"
            );
            self.remove_tracks(&record.hash).await;
            if let Err(rollback) = self.index_repo.discard_pending(&record.hash).await {
                tracing::error!(
                    hash = %record.hash,
                    error = %rollback,
                    "Failed to discard pending phrase"
                );
            }
            return Err(PhraseServiceError::Dependency(e.to_string()));
        }

        Ok(())
    }

    async fn remove_tracks(&self, hash: &str) {
        for key in self.playback_order.keys() {
            if let Err(e) = self.track_repo.remove(hash, key).await {
                tracing::warn!(hash = %hash, voice = %key, error = %e, "Failed to remove track");
            }
        }
    }

    async fn resolve_records(&self, hashes: &[String]) -> Result<Vec<PhraseRecord>, PhraseServiceError> {
        let records = self.log_repo.find_by_hashes(hashes).await?;
        if records.len() != hashes.len() {
            let missing: Vec<&String> = hashes
                .iter()
                .filter(|h| !records.iter().any(|r| &r.hash == *h))
                .collect();
            tracing::error!(missing = ?missing, "Indexed phrases missing from the log");
            return Err(PhraseServiceError::NotFound(format!(
                "phrase records for {:?}",
                missing
            )));
        }
        Ok(records)
    }
}
