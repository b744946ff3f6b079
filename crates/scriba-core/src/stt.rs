//! **Speech-to-text client** — submit an uploaded audio file to the external
//! transcription service and wait for a terminal status.
//!
//! The service is an opaque collaborator: upload the bytes, create a
//! transcript job with the requested language and speaker-labels flag, poll
//! until `completed` or `error`. An error status is surfaced verbatim; there
//! is no retry and no cancellation once a job is submitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GatewayConfig;
use crate::error::{ScribaError, ScribaResult};
use crate::transcript::{Transcript, TranscriptionOptions, Utterance};
use crate::upload::AudioUpload;

/// Seam to the external speech-to-text service. Implemented by the production
/// AssemblyAI client and by the scripted placeholder used in tests.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe one upload. Blocks (asynchronously) until the service
    /// reaches a terminal status.
    async fn transcribe(
        &self,
        upload: &AudioUpload,
        options: &TranscriptionOptions,
    ) -> ScribaResult<Transcript>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    utterances: Option<Vec<Utterance>>,
    #[serde(default)]
    error: Option<String>,
}

/// Production backend for the AssemblyAI HTTP API.
///
/// Flow: `POST /v2/upload` with the raw bytes, `POST /v2/transcript` with the
/// fixed "best" model tier plus the requested options, then poll
/// `GET /v2/transcript/{id}` until terminal.
#[derive(Debug, Clone)]
pub struct AssemblyAiBackend {
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl AssemblyAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        poll_interval: Duration,
    ) -> ScribaResult<Self> {
        let base_url: String = base_url.into();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScribaError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            poll_interval,
            client,
        })
    }

    /// Build from the gateway configuration.
    pub fn from_config(config: &GatewayConfig) -> ScribaResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    async fn upload_audio(&self, upload: &AudioUpload) -> ScribaResult<String> {
        let url = format!("{}/v2/upload", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .body(upload.bytes.clone())
            .send()
            .await?;
        let res = check_status(res).await?;
        let body: UploadResponse = res.json().await?;
        Ok(body.upload_url)
    }

    async fn submit(&self, audio_url: &str, options: &TranscriptionOptions) -> ScribaResult<String> {
        let url = format!("{}/v2/transcript", self.base_url);
        let payload = json!({
            "audio_url": audio_url,
            "speech_model": "best",
            "language_code": options.language.code(),
            "speaker_labels": options.speaker_recognition,
        });
        let res = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .json(&payload)
            .send()
            .await?;
        let res = check_status(res).await?;
        let body: TranscriptResponse = res.json().await?;
        if body.status == "error" {
            return Err(ScribaError::Service(body.error.unwrap_or_default()));
        }
        Ok(body.id)
    }

    async fn poll(&self, id: &str) -> ScribaResult<Transcript> {
        let url = format!("{}/v2/transcript/{}", self.base_url, id);
        loop {
            let res = self
                .client
                .get(&url)
                .header("authorization", &self.api_key)
                .send()
                .await?;
            let res = check_status(res).await?;
            let body: TranscriptResponse = res.json().await?;
            match body.status.as_str() {
                "completed" => {
                    return Ok(Transcript {
                        text: body.text.unwrap_or_default(),
                        utterances: body.utterances.unwrap_or_default(),
                    })
                }
                "error" => return Err(ScribaError::Service(body.error.unwrap_or_default())),
                // queued | processing
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

#[async_trait]
impl TranscriptionBackend for AssemblyAiBackend {
    async fn transcribe(
        &self,
        upload: &AudioUpload,
        options: &TranscriptionOptions,
    ) -> ScribaResult<Transcript> {
        upload.validate()?;
        tracing::info!(
            "submitting {} ({} bytes, language={}, speaker_labels={})",
            upload.file_name,
            upload.bytes.len(),
            options.language.code(),
            options.speaker_recognition
        );
        let audio_url = self.upload_audio(upload).await?;
        let id = self.submit(&audio_url, options).await?;
        self.poll(&id).await
    }
}

async fn check_status(res: reqwest::Response) -> ScribaResult<reqwest::Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(ScribaError::Http(format!("API error {}: {}", status, body)))
}

/// Scripted backend for tests and keyless development runs. Returns a fixed
/// transcript or a fixed error and counts invocations so tests can assert the
/// service was never reached.
#[derive(Debug, Default)]
pub struct PlaceholderBackend {
    transcript: Option<Transcript>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl PlaceholderBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(transcript: Transcript) -> Self {
        Self {
            transcript: Some(transcript),
            ..Self::default()
        }
    }

    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of times `transcribe` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionBackend for PlaceholderBackend {
    async fn transcribe(
        &self,
        upload: &AudioUpload,
        _options: &TranscriptionOptions,
    ) -> ScribaResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.error {
            return Err(ScribaError::Service(message.clone()));
        }
        Ok(self.transcript.clone().unwrap_or_else(|| Transcript {
            text: format!(
                "[placeholder transcript: {} bytes from {}]",
                upload.bytes.len(),
                upload.file_name
            ),
            utterances: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Language;

    #[tokio::test]
    async fn placeholder_returns_scripted_transcript() {
        let backend = PlaceholderBackend::with_transcript(Transcript {
            text: "hello world".to_string(),
            utterances: Vec::new(),
        });
        let upload = AudioUpload::new("interview.mp3", vec![0u8; 16]);
        let options = TranscriptionOptions::default();
        let transcript = backend.transcribe(&upload, &options).await.unwrap();
        assert_eq!(transcript.text, "hello world");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn placeholder_surfaces_error_verbatim() {
        let backend = PlaceholderBackend::with_error("Download error: audio file is corrupt");
        let upload = AudioUpload::new("interview.mp3", vec![0u8; 16]);
        let options = TranscriptionOptions {
            language: Language::De,
            speaker_recognition: true,
        };
        let err = backend.transcribe(&upload, &options).await.unwrap_err();
        match err {
            ScribaError::Service(msg) => {
                assert_eq!(msg, "Download error: audio file is corrupt")
            }
            other => panic!("expected Service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn placeholder_default_mentions_upload() {
        let backend = PlaceholderBackend::new();
        let upload = AudioUpload::new("interview.wav", vec![0u8; 42]);
        let transcript = backend
            .transcribe(&upload, &TranscriptionOptions::default())
            .await
            .unwrap();
        assert!(transcript.text.contains("42 bytes"));
        assert!(transcript.text.contains("interview.wav"));
    }

    #[test]
    fn transcript_response_parses_completed_payload() {
        let raw = r#"{
            "id": "tx-1",
            "status": "completed",
            "text": "Hello Hi",
            "utterances": [
                { "speaker": "A", "text": "Hello" },
                { "speaker": "B", "text": "Hi" }
            ]
        }"#;
        let parsed: TranscriptResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.id, "tx-1");
        assert_eq!(parsed.status, "completed");
        assert_eq!(parsed.text.as_deref(), Some("Hello Hi"));
        let utterances = parsed.utterances.unwrap();
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].speaker, "A");
        assert_eq!(utterances[1].text, "Hi");
    }

    #[test]
    fn transcript_response_parses_error_payload() {
        let raw = r#"{ "id": "tx-2", "status": "error", "error": "Audio too short" }"#;
        let parsed: TranscriptResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, "error");
        assert_eq!(parsed.error.as_deref(), Some("Audio too short"));
        assert!(parsed.text.is_none());
        assert!(parsed.utterances.is_none());
    }
}
