//! HTTP API layer: OpenAI-compatible voice listing and speech synthesis.
//!
//! Both unversioned and `/v1`-prefixed routes are served. Validation runs
//! strictly before synthesis: content-type, JSON shape, response format,
//! then voice resolution — a doomed request never reaches the backend.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::SynthesisBackend;
use crate::classify::ExtendedVoiceSpec;
use crate::config::AudioConfig;
use crate::dispatch;
use crate::encode::ConverterRegistry;
use crate::error::{ApiError, ErrorBody};
use crate::voice::VoiceDirectory;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SynthesisBackend>,
    pub converters: Arc<ConverterRegistry>,
    pub audio: AudioConfig,
}

// --- Request/Response types ---

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    input: String,
    voice: String,
    response_format: String,
}

#[derive(Serialize)]
struct VoicesResponse {
    voices: Vec<VoiceEntry>,
}

#[derive(Serialize)]
struct VoiceEntry {
    id: String,
    name: String,
}

/// How the request's `voice` field is interpreted.
enum VoiceMode {
    Plain(String),
    Extended(ExtendedVoiceSpec),
}

/// Attempt structured decode of the voice field; anything that does not
/// parse as an extended spec is a plain voice identifier.
fn interpret_voice(raw: &str) -> VoiceMode {
    match serde_json::from_str::<ExtendedVoiceSpec>(raw) {
        Ok(spec) => VoiceMode::Extended(spec),
        Err(_) => VoiceMode::Plain(raw.to_string()),
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/audio/voices", get(handle_voices))
        .route("/v1/audio/voices", get(handle_voices))
        .route("/audio/speech", post(handle_speech))
        .route("/v1/audio/speech", post(handle_speech))
        .fallback(handle_not_found)
        .with_state(state)
}

// --- Handlers ---

async fn handle_voices(State(state): State<AppState>) -> Result<Json<VoicesResponse>, ApiError> {
    let directory = VoiceDirectory::load(state.backend.as_ref())
        .await
        .map_err(|e| ApiError::VoiceListing(e.to_string()))?;

    let voices = directory
        .list_enabled()
        .iter()
        .map(|v| VoiceEntry {
            id: v.id.clone(),
            name: v.label(),
        })
        .collect();

    Ok(Json(VoicesResponse { voices }))
}

async fn handle_speech(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    check_content_type(&headers)?;

    let request: SpeechRequest =
        serde_json::from_str(&body).map_err(|e| ApiError::BadJson(e.to_string()))?;

    // Format name is known without touching the backend; reject first.
    let converter = state
        .converters
        .get(&request.response_format)
        .ok_or_else(|| ApiError::UnsupportedFormat(request.response_format.clone()))?;

    let directory = VoiceDirectory::load(state.backend.as_ref())
        .await
        .map_err(|e| ApiError::VoiceListing(e.to_string()))?;
    let mut session = state.backend.open_session();

    let pcm = match interpret_voice(&request.voice) {
        VoiceMode::Plain(voice_id) => {
            info!(
                "Speech request: voice={voice_id} format={} ({} chars)",
                request.response_format,
                request.input.len()
            );
            dispatch::speak(session.as_mut(), &directory, &request.input, &voice_id).await?
        }
        VoiceMode::Extended(spec) => {
            info!(
                "Speech request: {} culture bindings, default={} format={} ({} chars)",
                spec.bindings.len(),
                spec.default_culture,
                request.response_format,
                request.input.len()
            );
            dispatch::speak_extended(session.as_mut(), &directory, &request.input, &spec).await?
        }
    };

    let audio = state.audio;
    let encoded = tokio::task::spawn_blocking(move || {
        converter
            .convert(audio.sample_rate, audio.channels, &pcm)
            .map(|bytes| (bytes, converter.mime_type()))
    })
    .await
    .map_err(|e| ApiError::Encoding(format!("encoder task failed: {e}")))?
    .map_err(|e| ApiError::Encoding(e.to_string()))?;

    let (bytes, mime_type) = encoded;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime_type)],
        bytes,
    )
        .into_response())
}

async fn handle_not_found(method: Method, uri: Uri) -> Response {
    let body = ErrorBody::new(
        "not found",
        format!("route {method} {} does not exist", uri.path()),
    );
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn check_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
    let raw = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Tolerate parameters such as charset, but nothing other than JSON.
    let essence = raw.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else {
        Err(ApiError::BadContentType(raw.to_string()))
    }
}
