use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod youtube;

pub use youtube::YtDlpResolver;

use crate::ReferenceError;

/// Fixed subdirectory of the media root that holds downloaded audio
pub const AUDIO_SUBDIR: &str = "audio_files";

/// Substrings a link must contain to be accepted
const ACCEPTED_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// A link to a remotely hosted video that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference(String);

impl SourceReference {
    /// Validate a user-supplied link without touching the network
    pub fn parse(link: &str) -> Result<Self, ReferenceError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(ReferenceError::Missing);
        }

        // Anything starting with '-' would look like a downloader option
        if link.starts_with('-') || !ACCEPTED_HOSTS.iter().any(|host| link.contains(host)) {
            return Err(ReferenceError::UnsupportedHost);
        }

        Ok(Self(link.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio codecs the resolver can transcode to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
    Webm,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Webm => "webm",
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Webm => "audio/webm",
        }
    }
}

/// Downloaded audio file, keyed by the provider's content id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Provider-assigned content id
    pub id: String,

    /// Location on disk
    pub path: PathBuf,

    pub format: AudioFormat,
}

impl AudioArtifact {
    /// Deterministic location of the artifact for a content id
    pub fn locate(audio_dir: &Path, id: &str, format: AudioFormat) -> Self {
        Self {
            id: id.to_string(),
            path: audio_dir.join(format!("{}.{}", id, format.as_str())),
            format,
        }
    }
}

/// Failures of the media stages
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0}")]
    MetadataUnavailable(String),

    #[error("{0}")]
    DownloadFailed(String),
}

/// Looks up video metadata and downloads its audio
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Fetch the display title without downloading anything
    async fn resolve_title(&self, reference: &SourceReference) -> Result<String, ResolveError>;

    /// Download the best audio stream and transcode it into the audio directory
    async fn fetch_audio(&self, reference: &SourceReference) -> Result<AudioArtifact, ResolveError>;
}
