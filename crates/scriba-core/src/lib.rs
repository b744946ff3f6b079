//! # Scriba Core — password-gated interview transcription
//!
//! Domain library for the Scriba gateway: the password gate, per-visit
//! session state, transcription options and transcript formatting, and the
//! client for the external speech-to-text service (AssemblyAI wire contract).
//!
//! ## Flow
//!
//! ```text
//! authenticate → upload → configure → submit → format → display/download
//! ```
//!
//! The service behind [`TranscriptionBackend`] is a black box; this crate
//! only honors its request/response contract and formats the result.

pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod stt;
pub mod transcript;
pub mod upload;

pub use auth::{hash_password, verify_password};
pub use config::GatewayConfig;
pub use error::{ScribaError, ScribaResult};
pub use session::{Session, SessionStore, TranscriptionGuard};
pub use stt::{AssemblyAiBackend, PlaceholderBackend, TranscriptionBackend};
pub use transcript::{format_transcript, Language, Transcript, TranscriptionOptions, Utterance};
pub use upload::{derive_download_name, AudioUpload, SUPPORTED_EXTENSIONS};
