//! Transcription options and transcript formatting.
//!
//! The external service returns either a flat text or an ordered sequence of
//! speaker-attributed utterances. `format_transcript` turns that into the
//! string shown to the user and offered for download: the flat text
//! unmodified, or one bolded speaker block per utterance with the tag
//! localized to the requested language.

use serde::{Deserialize, Serialize};

/// Transcription language offered on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    /// ISO 639-1 code sent to the service.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }

    /// Localized speaker tag for the formatted transcript.
    pub fn speaker_tag(&self) -> &'static str {
        match self {
            Language::En => "Speaker",
            Language::De => "Sprecher",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.eq_ignore_ascii_case("en") {
            Some(Language::En)
        } else if code.eq_ignore_ascii_case("de") {
            Some(Language::De)
        } else {
            None
        }
    }
}

/// Options selected on the form. Built fresh for every submit, never retained.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TranscriptionOptions {
    pub language: Language,
    pub speaker_recognition: bool,
}

/// One speech segment attributed to a speaker, in the order the service
/// returned it (assumed chronological).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
}

/// Terminal success payload from the external service. `utterances` is empty
/// when speaker labels were off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub utterances: Vec<Utterance>,
}

/// Format a terminal transcript for display and download.
///
/// With speaker recognition off the service's flat text is returned
/// byte-for-byte. With it on, each utterance becomes a
/// `**<tag> <speaker>**: <text>` block, blocks separated by a paragraph
/// break, service order preserved.
pub fn format_transcript(transcript: &Transcript, options: &TranscriptionOptions) -> String {
    if !options.speaker_recognition {
        return transcript.text.clone();
    }
    transcript
        .utterances
        .iter()
        .map(|u| {
            format!(
                "**{} {}**: {}",
                options.language.speaker_tag(),
                u.speaker,
                u.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n\n")
}
