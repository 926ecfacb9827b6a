//! Blog Scribe - turn a YouTube video into a written blog article
//!
//! This library downloads the audio of a video with yt-dlp, transcribes it with an
//! AssemblyAI-compatible speech-to-text service, asks an OpenAI-compatible language
//! model to write an article from the transcript, and stores the result per user.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{AudioArtifact, MediaResolver, SourceReference};
pub use generate::ContentGenerator;
pub use pipeline::{BlogPipeline, GeneratedPost, Stage};
pub use store::{BlogPost, BlogStore};
pub use transcribe::{Transcriber, Transcript};

/// Result type used by the application glue (config, CLI, server startup)
pub type Result<T> = anyhow::Result<T>;

/// External service that needs an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    SpeechToText,
    TextGeneration,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::SpeechToText => write!(f, "AssemblyAI"),
            Service::TextGeneration => write!(f, "Groq"),
        }
    }
}

/// Why a link was rejected before any network call
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("YouTube link not provided")]
    Missing,

    #[error("Provided link is not a valid YouTube URL")]
    UnsupportedHost,
}

/// Terminal outcome of a failed pipeline run. Every stage maps to exactly one kind.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidReference(#[from] ReferenceError),

    #[error("Failed to fetch YouTube title: {0}")]
    MetadataUnavailable(String),

    #[error("Audio download failed: {0}")]
    DownloadFailed(String),

    #[error("{service} API key not set")]
    MissingCredential { service: Service },

    #[error("Transcription failed: {0}")]
    TranscriptionUnavailable(String),

    #[error("Failed to generate blog content: {0}")]
    GenerationFailed(String),

    #[error("Failed to save blog post: {0}")]
    PersistFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Stage that produced this failure
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidReference(_) => Stage::ValidateReference,
            PipelineError::MetadataUnavailable(_) => Stage::ResolveTitle,
            PipelineError::DownloadFailed(_) => Stage::FetchAudio,
            PipelineError::MissingCredential {
                service: Service::SpeechToText,
            }
            | PipelineError::TranscriptionUnavailable(_) => Stage::Transcribe,
            PipelineError::MissingCredential {
                service: Service::TextGeneration,
            }
            | PipelineError::GenerationFailed(_) => Stage::Generate,
            PipelineError::PersistFailed(_) => Stage::Persist,
            PipelineError::Internal(_) => Stage::Internal,
        }
    }

    /// Message shown to the caller
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::InvalidReference(reason) => reason.to_string(),
            PipelineError::MetadataUnavailable(_) => "Failed to fetch YouTube title".to_string(),
            PipelineError::DownloadFailed(_)
            | PipelineError::TranscriptionUnavailable(_)
            | PipelineError::MissingCredential {
                service: Service::SpeechToText,
            } => "Could not retrieve transcript".to_string(),
            PipelineError::GenerationFailed(_)
            | PipelineError::MissingCredential {
                service: Service::TextGeneration,
            } => "Failed to generate blog content".to_string(),
            PipelineError::PersistFailed(_) => "Failed to save blog post".to_string(),
            PipelineError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Underlying reason, if there is more to say than the public message
    pub fn detail(&self) -> Option<String> {
        match self {
            PipelineError::InvalidReference(_) => None,
            PipelineError::MissingCredential { service } => {
                Some(format!("{} API key not set", service))
            }
            PipelineError::MetadataUnavailable(detail)
            | PipelineError::DownloadFailed(detail)
            | PipelineError::TranscriptionUnavailable(detail)
            | PipelineError::GenerationFailed(detail)
            | PipelineError::PersistFailed(detail)
            | PipelineError::Internal(detail) => Some(detail.clone()),
        }
    }

    /// Whether the caller sent something unusable, as opposed to a downstream fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidReference(_) | PipelineError::MetadataUnavailable(_)
        )
    }
}

impl From<extractors::ResolveError> for PipelineError {
    fn from(err: extractors::ResolveError) -> Self {
        match err {
            extractors::ResolveError::MetadataUnavailable(reason) => {
                PipelineError::MetadataUnavailable(reason)
            }
            extractors::ResolveError::DownloadFailed(reason) => PipelineError::DownloadFailed(reason),
        }
    }
}

impl From<transcribe::TranscribeError> for PipelineError {
    fn from(err: transcribe::TranscribeError) -> Self {
        match err {
            transcribe::TranscribeError::MissingCredential => PipelineError::MissingCredential {
                service: Service::SpeechToText,
            },
            transcribe::TranscribeError::Unavailable(reason) => {
                PipelineError::TranscriptionUnavailable(reason)
            }
        }
    }
}

impl From<generate::GenerateError> for PipelineError {
    fn from(err: generate::GenerateError) -> Self {
        match err {
            generate::GenerateError::MissingCredential => PipelineError::MissingCredential {
                service: Service::TextGeneration,
            },
            generate::GenerateError::Failed(reason) => PipelineError::GenerationFailed(reason),
        }
    }
}

impl From<store::StoreError> for PipelineError {
    fn from(err: store::StoreError) -> Self {
        PipelineError::PersistFailed(err.to_string())
    }
}
