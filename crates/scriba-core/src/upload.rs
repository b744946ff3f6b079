//! Uploaded audio files and download-name derivation.

use bytes::Bytes;

use crate::error::{ScribaError, ScribaResult};

/// Extensions the upload surface accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// One uploaded audio file. Ephemeral: owned by a single submit cycle. The
/// payload is `Bytes`, so handing it to the service client never copies the
/// audio buffer.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl AudioUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reject empty uploads and unknown extensions before any service call.
    pub fn validate(&self) -> ScribaResult<()> {
        if self.bytes.is_empty() || self.file_name.trim().is_empty() {
            return Err(ScribaError::EmptyUpload);
        }
        let supported = extension(&self.file_name)
            .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
            .unwrap_or(false);
        if !supported {
            return Err(ScribaError::UnsupportedFormat(self.file_name.clone()));
        }
        Ok(())
    }

    /// Download name for the finished transcript.
    pub fn download_name(&self) -> String {
        derive_download_name(&self.file_name)
    }
}

fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Replace the final extension with `.txt`; only the last dot segment is
/// stripped, so `a.b.wav` becomes `a.b.txt`.
pub fn derive_download_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((base, _)) => format!("{}.txt", base),
        None => format!("{}.txt", file_name),
    }
}
