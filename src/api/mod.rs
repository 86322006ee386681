//! HTTP boundary — the axum router and its handlers.
//!
//! Thin layer: handlers validate the language tag, delegate to the
//! [`Assistant`] and the weather/vision clients, and shape JSON responses.
//! Error responses carry a FastAPI-style `{"detail": ...}` body.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::lang::LanguageTag;
use crate::pipeline::{start_session, Assistant, SessionHandle};
use crate::translate::TranslationGateway;
use crate::vision::CropClassifier;
use crate::weather::{WeatherClient, WeatherReport};

// ---------------------------------------------------------------------------
// ApiState
// ---------------------------------------------------------------------------

/// Shared state for API handlers.
pub struct ApiState {
    pub assistant: Arc<Assistant>,
    pub translator: TranslationGateway,
    pub weather: Option<WeatherClient>,
    pub crops: Option<Arc<dyn CropClassifier>>,
    /// Running voice sessions, at most one per language.
    pub sessions: Mutex<HashMap<LanguageTag, SessionHandle>>,
    pub default_language: LanguageTag,
}

impl ApiState {
    pub fn new(
        assistant: Arc<Assistant>,
        translator: TranslationGateway,
        weather: Option<WeatherClient>,
        crops: Option<Arc<dyn CropClassifier>>,
        default_language: LanguageTag,
    ) -> Self {
        Self {
            assistant,
            translator,
            weather,
            crops,
            sessions: Mutex::new(HashMap::new()),
            default_language,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/ask", post(ask))
        .route("/start_voice_assistant/{language}", get(start_voice_assistant))
        .route("/stop_voice_assistant/{language}", get(stop_voice_assistant))
        .route("/detect_crop", post(detect_crop))
        .route("/weather/{city}", get(weather))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct AskResponse {
    response: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

#[derive(Serialize)]
struct CropResponse {
    crop: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

type ApiError = (StatusCode, Json<ErrorDetail>);

fn error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorDetail {
            detail: detail.into(),
        }),
    )
}

fn parse_language(tag: &str) -> Result<LanguageTag, ApiError> {
    tag.parse().map_err(|_| {
        error(
            StatusCode::BAD_REQUEST,
            format!("language not supported: {tag}"),
        )
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Farmer AI App!",
    })
}

#[derive(Deserialize)]
struct AskForm {
    question: String,
    language: Option<String>,
}

async fn ask(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<AskForm>,
) -> Result<Json<AskResponse>, ApiError> {
    let language = match form.language.as_deref() {
        Some(tag) => parse_language(tag)?,
        None => state.default_language,
    };

    let response = state.assistant.answer(&form.question, language).await;
    Ok(Json(AskResponse { response }))
}

async fn start_voice_assistant(
    State(state): State<Arc<ApiState>>,
    Path(language): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let language = parse_language(&language)?;

    let handle = start_session(Arc::clone(&state.assistant), language);

    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| error(StatusCode::INTERNAL_SERVER_ERROR, "session registry poisoned"))?;
    if let Some(previous) = sessions.insert(language, handle) {
        log::info!("replacing running voice session ({language})");
        previous.stop();
    }

    Ok(Json(StatusResponse {
        status: format!("voice assistant started in {language}"),
    }))
}

async fn stop_voice_assistant(
    State(state): State<Arc<ApiState>>,
    Path(language): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let language = parse_language(&language)?;

    let removed = state
        .sessions
        .lock()
        .map_err(|_| error(StatusCode::INTERNAL_SERVER_ERROR, "session registry poisoned"))?
        .remove(&language);

    match removed {
        Some(handle) => {
            handle.stop();
            Ok(Json(StatusResponse {
                status: format!("voice assistant stopped in {language}"),
            }))
        }
        None => Err(error(
            StatusCode::NOT_FOUND,
            format!("no voice assistant running in {language}"),
        )),
    }
}

async fn detect_crop(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<CropResponse>, ApiError> {
    let mut image: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") || image.is_none() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| error(StatusCode::BAD_REQUEST, format!("bad upload: {e}")))?;
            image = Some(bytes.to_vec());
        }
    }

    let image = image.ok_or_else(|| error(StatusCode::BAD_REQUEST, "no file uploaded"))?;

    // Classification failures are reported in-band so the client always gets
    // a `crop` field to display.
    let crop = match &state.crops {
        Some(classifier) => match classifier.classify(&image).await {
            Ok(label) => format!("Crop detected: {label}"),
            Err(e) => {
                log::warn!("crop classification failed: {e}");
                format!("Crop detection error: {e}")
            }
        },
        None => "Crop detection error: no classifier configured".to_string(),
    };

    Ok(Json(CropResponse { crop }))
}

#[derive(Deserialize)]
struct WeatherQuery {
    language: Option<String>,
}

async fn weather(
    State(state): State<Arc<ApiState>>,
    Path(city): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>, ApiError> {
    let language = match query.language.as_deref() {
        Some(tag) => parse_language(tag)?,
        None => state.default_language,
    };

    let client = state.weather.as_ref().ok_or_else(|| {
        error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "weather API key missing",
        )
    })?;

    let report = client
        .current(&city, language, &state.translator)
        .await
        .map_err(|e| {
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("weather lookup failed: {e}"),
            )
        })?;

    Ok(Json(report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
