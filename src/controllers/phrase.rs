use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::{
    domain::phrase::{
        GeneratePhraseRequest, PhraseResponse, PhraseService, PhraseServiceApi, RetrieveQuery,
        SelectionPolicy, SessionResponse,
    },
    error::{AppError, AppResult},
};

/// Longest accepted phrase, in characters
const MAX_PHRASE_CHARS: usize = 500;
const DEFAULT_SESSION_LENGTH: i64 = 1;

pub struct PhraseController {
    phrase_service: Arc<PhraseService>,
}

impl PhraseController {
    pub fn new(phrase_service: Arc<PhraseService>) -> Self {
        Self { phrase_service }
    }

    /// POST /api/phrases - Generate study material for a phrase
    pub async fn generate(
        State(controller): State<Arc<PhraseController>>,
        Json(request): Json<GeneratePhraseRequest>,
    ) -> AppResult<(StatusCode, Json<PhraseResponse>)> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }
        if request.text.chars().count() > MAX_PHRASE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Text must be {} characters or less",
                MAX_PHRASE_CHARS
            )));
        }

        let record = controller.phrase_service.generate(request.text).await?;
        Ok((StatusCode::CREATED, Json(PhraseResponse::from(record))))
    }

    /// GET /api/phrases?policy=frequency&limit=3 - Ranked retrieval
    pub async fn retrieve(
        State(controller): State<Arc<PhraseController>>,
        Query(query): Query<RetrieveQuery>,
    ) -> AppResult<Json<SessionResponse>> {
        let policy = query.policy.unwrap_or(SelectionPolicy::Frequency);
        let limit = query.limit.unwrap_or(DEFAULT_SESSION_LENGTH);

        let session = controller.phrase_service.retrieve(policy, limit).await?;
        Ok(Json(SessionResponse::from(session)))
    }

    /// GET /api/phrases/random - One random phrase
    pub async fn random(
        State(controller): State<Arc<PhraseController>>,
    ) -> AppResult<Json<SessionResponse>> {
        let session = controller.phrase_service.random().await?;
        Ok(Json(SessionResponse::from(session)))
    }

    /// GET /api/phrases/{hash} - One phrase with its playback
    pub async fn find(
        State(controller): State<Arc<PhraseController>>,
        Path(hash): Path<String>,
    ) -> AppResult<Json<SessionResponse>> {
        let session = controller.phrase_service.find(&hash).await?;
        Ok(Json(SessionResponse::from(session)))
    }

    /// GET /api/phrases/{hash}/audio - Playback of one phrase as a WAV body
    pub async fn audio(
        State(controller): State<Arc<PhraseController>>,
        Path(hash): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let session = controller.phrase_service.find(&hash).await?;
        let playback = session
            .playback
            .ok_or_else(|| AppError::NotFound(format!("playback for {hash}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
        if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", playback.duration_secs())) {
            headers.insert("X-Duration-Seconds", value);
        }

        Ok((StatusCode::OK, headers, Body::from(playback.wav)))
    }

    /// DELETE /api/phrases/{hash} - Remove a phrase from retrieval
    pub async fn delete(
        State(controller): State<Arc<PhraseController>>,
        Path(hash): Path<String>,
    ) -> AppResult<StatusCode> {
        controller.phrase_service.delete(&hash).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
