//! Axum HTTP gateway for Scriba: a password-gated upload form backend.
//!
//! Control flow is strictly linear per session: open a session, authenticate
//! against the operator password, upload an audio file with its options,
//! block on the external speech-to-text service, then fetch or download the
//! formatted transcript. API keys live in the backend only; the page never
//! receives them.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use scriba_core::{
    format_transcript, verify_password, AssemblyAiBackend, AudioUpload, GatewayConfig, Language,
    ScribaError, SessionStore, TranscriptionBackend, TranscriptionOptions,
};

/// Header carrying the session id issued by `POST /v1/session`.
const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
struct AppState {
    config: Arc<GatewayConfig>,
    sessions: Arc<SessionStore>,
    backend: Arc<dyn TranscriptionBackend>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/status", get(status))
        .route("/v1/session", post(open_session).delete(close_session))
        .route("/v1/login", post(login))
        .route("/v1/transcribe", post(transcribe))
        .route("/v1/transcript", get(get_transcript))
        .route("/v1/download", get(download))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "app_name": state.config.app_name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Session creation ("first page load"). State starts unauthenticated with an
/// empty transcript.
async fn open_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    let id = state.sessions.create();
    tracing::info!("session {} opened", id);
    Json(json!({ "session_id": id.to_string() }))
}

async fn close_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(id) = session_id(&headers) {
        state.sessions.remove(&id);
        tracing::info!("session {} closed", id);
    }
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    password: String,
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Response {
    let Some(id) = session_id(&headers).filter(|id| state.sessions.contains(id)) else {
        return error_body(StatusCode::UNAUTHORIZED, "Unknown session");
    };
    if verify_password(&req.password, &state.config.password_hash) {
        state.sessions.set_authenticated(&id);
        (StatusCode::OK, Json(json!({ "authenticated": true }))).into_response()
    } else {
        tracing::warn!("failed login attempt for session {}", id);
        error_body(StatusCode::UNAUTHORIZED, "Incorrect password")
    }
}

/// Multipart submit: `file` (required), `language` (`en` | `de`, default
/// `en`), `speaker_recognition` (default off). One request per session at a
/// time; the in-flight guard answers 409 to double-submits.
async fn transcribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let Some(id) = session_id(&headers).filter(|id| state.sessions.contains(id)) else {
        return error_body(StatusCode::UNAUTHORIZED, "Unknown session");
    };
    if !state.sessions.is_authenticated(&id) {
        return error_body(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    let mut upload: Option<AudioUpload> = None;
    let mut language = Language::En;
    let mut speaker_recognition = false;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_body(
                    StatusCode::BAD_REQUEST,
                    &format!("Malformed upload: {}", e),
                )
            }
        };
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some(AudioUpload::new(file_name, bytes)),
                    Err(e) => {
                        return error_body(
                            StatusCode::BAD_REQUEST,
                            &format!("Upload failed: {}", e),
                        )
                    }
                }
            }
            Some("language") => {
                let value = field.text().await.unwrap_or_default();
                match Language::from_code(&value) {
                    Some(l) => language = l,
                    None => {
                        return error_body(
                            StatusCode::BAD_REQUEST,
                            &format!("Unknown language: {}", value.trim()),
                        )
                    }
                }
            }
            Some("speaker_recognition") => {
                let value = field.text().await.unwrap_or_default();
                let value = value.trim();
                speaker_recognition =
                    value.eq_ignore_ascii_case("true") || value == "1" || value.eq_ignore_ascii_case("on");
            }
            _ => {}
        }
    }

    // Warn without touching the service when there is nothing to transcribe.
    let Some(upload) = upload else {
        return error_body(StatusCode::BAD_REQUEST, &ScribaError::EmptyUpload.to_string());
    };
    if let Err(e) = upload.validate() {
        return error_body(StatusCode::BAD_REQUEST, &e.to_string());
    }

    // The guard releases on drop, so a handler future cancelled mid-await
    // (client disconnect) cannot wedge the session.
    let Some(_in_flight) = state.sessions.begin_transcription(&id) else {
        return error_body(
            StatusCode::CONFLICT,
            "A transcription is already running for this session",
        );
    };
    let options = TranscriptionOptions {
        language,
        speaker_recognition,
    };
    let result = state.backend.transcribe(&upload, &options).await;

    match result {
        Ok(transcript) => {
            let formatted = format_transcript(&transcript, &options);
            let download_name = upload.download_name();
            state
                .sessions
                .store_transcript(&id, formatted.clone(), download_name.clone());
            tracing::info!("session {}: transcription complete", id);
            (
                StatusCode::OK,
                Json(json!({
                    "transcript": formatted,
                    "download_name": download_name,
                })),
            )
                .into_response()
        }
        // Failures are returned to the caller; the stored transcript is
        // never mutated on failure.
        Err(e) => {
            tracing::warn!("session {}: transcription failed: {}", id, e);
            error_body(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

async fn get_transcript(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = session_id(&headers).and_then(|id| state.sessions.get(&id)) else {
        return error_body(StatusCode::UNAUTHORIZED, "Unknown session");
    };
    if session.transcript.is_empty() {
        return error_body(StatusCode::NOT_FOUND, "No transcript yet");
    }
    Json(json!({
        "transcript": session.transcript,
        "download_name": session.download_name,
    }))
    .into_response()
}

/// Transcript as a plain-text attachment named after the uploaded file with
/// its extension replaced by `.txt`.
async fn download(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = session_id(&headers).and_then(|id| state.sessions.get(&id)) else {
        return error_body(StatusCode::UNAUTHORIZED, "Unknown session");
    };
    if session.transcript.is_empty() {
        return error_body(StatusCode::NOT_FOUND, "No transcript yet");
    }
    let file_name = session
        .download_name
        .unwrap_or_else(|| "transcript.txt".to_string());
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "text/plain; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        session.transcript,
    )
        .into_response()
}

#[tokio::main]
async fn main() {
    // Load .env first: USER_PW and the service API key stay in the backend.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!(
            "[scriba-gateway] .env not loaded: {} (using system environment)",
            e
        );
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("[scriba-gateway] {}", e);
            eprintln!("[scriba-gateway] Set USER_PW and ASSEMBLYAI_API_KEY in .env (see .env.example).");
            std::process::exit(1);
        }
    };

    let backend: Arc<dyn TranscriptionBackend> = match AssemblyAiBackend::from_config(&config) {
        Ok(b) => Arc::new(b),
        Err(e) => {
            eprintln!("[scriba-gateway] {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        config: Arc::clone(&config),
        sessions: Arc::new(SessionStore::new()),
        backend,
    };
    let app = router(state);

    // Local-only bind, as the form is operator-facing.
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("{} listening on {}", config.app_name, addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[scriba-gateway] failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown requested (Ctrl+C)");
    });
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }
}
