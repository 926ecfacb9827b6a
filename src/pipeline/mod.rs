use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::extractors::{MediaResolver, SourceReference, YtDlpResolver};
use crate::generate::{ContentGenerator, GroqGenerator};
use crate::store::{BlogStore, NewBlogPost};
use crate::transcribe::{AssemblyAiTranscriber, Transcriber};
use crate::PipelineError;

/// Steps of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateReference,
    ResolveTitle,
    FetchAudio,
    Transcribe,
    Generate,
    Persist,
    /// Not a real step: faults outside any stage contract
    Internal,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::ValidateReference => "validate_reference",
            Stage::ResolveTitle => "resolve_title",
            Stage::FetchAudio => "fetch_audio",
            Stage::Transcribe => "transcribe",
            Stage::Generate => "generate",
            Stage::Persist => "persist",
            Stage::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPost {
    /// Id of the stored blog post
    pub id: i64,
    pub title: String,
    /// Returned for display only, never stored
    pub transcript: String,
    pub content: String,
}

/// Runs resolve → download → transcribe → generate → persist for one link
pub struct BlogPipeline {
    resolver: Arc<dyn MediaResolver>,
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn ContentGenerator>,
    store: Arc<dyn BlogStore>,
}

impl BlogPipeline {
    pub fn new(
        resolver: Arc<dyn MediaResolver>,
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ContentGenerator>,
        store: Arc<dyn BlogStore>,
    ) -> Self {
        Self {
            resolver,
            transcriber,
            generator,
            store,
        }
    }

    /// Build the production collaborators from configuration
    pub fn from_config(config: &Config, store: Arc<dyn BlogStore>) -> crate::Result<Self> {
        let resolver = YtDlpResolver::new(config);
        let transcriber = AssemblyAiTranscriber::new(
            &config.transcription,
            config.transcription.resolve_api_key(),
        )?;
        let generator = GroqGenerator::new(&config.generation, config.generation.resolve_api_key())?;

        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(transcriber),
            Arc::new(generator),
            store,
        ))
    }

    /// Run the whole pipeline for `owner`. A post is stored only if every stage succeeded.
    pub async fn run(&self, owner: &str, link: &str) -> Result<GeneratedPost, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id, owner);

        async move {
            match self.execute(owner, link).await {
                Ok(post) => {
                    tracing::info!(post_id = post.id, "Pipeline completed");
                    Ok(post)
                }
                Err(err) => {
                    tracing::error!(stage = %err.stage(), error = %err, "Pipeline failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, owner: &str, link: &str) -> Result<GeneratedPost, PipelineError> {
        let reference = SourceReference::parse(link)?;

        tracing::info!(stage = %Stage::ResolveTitle, link = %reference, "Fetching title");
        let title = non_empty(self.resolver.resolve_title(&reference).await?).ok_or_else(|| {
            PipelineError::MetadataUnavailable("provider returned an empty title".to_string())
        })?;

        tracing::info!(stage = %Stage::FetchAudio, title = %title, "Downloading audio");
        let artifact = self.resolver.fetch_audio(&reference).await?;

        tracing::info!(stage = %Stage::Transcribe, path = %artifact.path.display(), "Transcribing audio");
        let transcript = match self.transcriber.transcribe(&artifact).await {
            Ok(transcript) => transcript,
            Err(err) => {
                // Left on disk for inspection
                tracing::warn!(path = %artifact.path.display(), "Audio artifact kept after failed transcription");
                return Err(err.into());
            }
        };
        let transcript = non_empty(transcript.text).ok_or_else(|| {
            PipelineError::TranscriptionUnavailable("service returned an empty transcript".to_string())
        })?;

        tracing::info!(stage = %Stage::Generate, transcript_chars = transcript.len(), "Generating article");
        let content = non_empty(self.generator.generate(&title, &transcript).await?).ok_or_else(|| {
            PipelineError::GenerationFailed("model returned empty content".to_string())
        })?;

        tracing::info!(stage = %Stage::Persist, "Saving blog post");
        let new_post = NewBlogPost {
            owner: owner.to_string(),
            youtube_title: title.clone(),
            youtube_link: reference.as_str().to_string(),
            generated_content: content.clone(),
        };
        // SQLite I/O stays off the async workers
        let store = Arc::clone(&self.store);
        let post = tokio::task::spawn_blocking(move || store.create(new_post))
            .await
            .map_err(|e| PipelineError::Internal(format!("persist task aborted: {}", e)))??;

        Ok(GeneratedPost {
            id: post.id,
            title,
            transcript,
            content,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
