use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::ErrorKind;

use crate::config::TranscriptionConfig;
use crate::extractors::AudioArtifact;

pub mod processor;

use processor::{PollSchedule, TranscriptionProcessor};

/// Text produced from one audio artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Id the service assigned to the transcript
    pub id: String,

    /// The transcribed text
    pub text: String,

    /// Audio duration in seconds, if reported
    pub audio_duration: Option<f64>,
}

/// Failures of the transcription stage
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscribeError {
    #[error("speech-to-text API key not set")]
    MissingCredential,

    #[error("{0}")]
    Unavailable(String),
}

/// Turns an audio artifact into text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the artifact. On success the artifact is removed from disk.
    async fn transcribe(&self, artifact: &AudioArtifact) -> Result<Transcript, TranscribeError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateTranscriptResponse {
    id: String,
}

/// Client for AssemblyAI's upload-then-poll transcription API
pub struct AssemblyAiTranscriber {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    language_code: Option<String>,
    schedule: PollSchedule,
}

impl AssemblyAiTranscriber {
    pub fn new(config: &TranscriptionConfig, api_key: Option<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client for transcription")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            language_code: config.language_code.clone(),
            schedule: PollSchedule::from_config(config),
        })
    }

    /// Upload the audio bytes and return the service-side URL
    async fn upload_audio(&self, api_key: &str, artifact: &AudioArtifact) -> Result<String, TranscribeError> {
        let audio_data = tokio::fs::read(&artifact.path).await.map_err(|e| {
            TranscribeError::Unavailable(format!(
                "failed to read audio file {}: {}",
                artifact.path.display(),
                e
            ))
        })?;

        tracing::debug!(bytes = audio_data.len(), "Uploading audio");

        let response = self
            .client
            .post(format!("{}/v2/upload", self.api_base))
            .header("authorization", api_key)
            .header("content-type", artifact.format.mime_type())
            .body(audio_data)
            .send()
            .await
            .map_err(|e| TranscribeError::Unavailable(format!("audio upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Unavailable(format!(
                "audio upload failed: HTTP {} {}",
                status, body
            )));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::Unavailable(format!("invalid upload response: {}", e)))?;

        Ok(upload.upload_url)
    }

    /// Create the transcript job and return its id
    async fn start_transcription(&self, api_key: &str, upload_url: &str) -> Result<String, TranscribeError> {
        let mut request_body = json!({ "audio_url": upload_url });
        if let Some(lang) = &self.language_code {
            request_body["language_code"] = json!(lang);
        }

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.api_base))
            .header("authorization", api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| TranscribeError::Unavailable(format!("failed to start transcription: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Unavailable(format!(
                "failed to start transcription: HTTP {} {}",
                status, body
            )));
        }

        let created: CreateTranscriptResponse = response.json().await.map_err(|e| {
            TranscribeError::Unavailable(format!("invalid transcription response: {}", e))
        })?;

        Ok(created.id)
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, artifact: &AudioArtifact) -> Result<Transcript, TranscribeError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(TranscribeError::MissingCredential)?;

        let upload_url = self.upload_audio(api_key, artifact).await?;
        let transcript_id = self.start_transcription(api_key, &upload_url).await?;

        tracing::info!(transcript_id = %transcript_id, "Transcription started");

        let resource = TranscriptionProcessor::new(
            &self.client,
            &self.api_base,
            api_key,
            transcript_id,
            self.schedule,
        )
        .wait_for_completion()
        .await?;

        let text = resource
            .text
            .ok_or_else(|| TranscribeError::Unavailable("completed transcript has no text".to_string()))?;

        remove_artifact(artifact);

        Ok(Transcript {
            id: resource.id,
            text,
            audio_duration: resource.audio_duration,
        })
    }
}

/// Delete a consumed artifact. Failure is logged and otherwise ignored.
fn remove_artifact(artifact: &AudioArtifact) {
    match fs_err::remove_file(&artifact.path) {
        Ok(()) => tracing::info!(path = %artifact.path.display(), "Cleaned up audio file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %artifact.path.display(), "Audio file already gone")
        }
        Err(e) => tracing::warn!(error = %e, "Failed to clean up audio file"),
    }
}
