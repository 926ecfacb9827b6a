//! Article writing through a chat-completions language model.

use async_trait::async_trait;

pub mod groq;
pub mod prompt;

pub use groq::GroqGenerator;
pub use prompt::ArticlePrompt;

/// Failures of the generation stage
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("language-model API key not set")]
    MissingCredential,

    #[error("{0}")]
    Failed(String),
}

/// Writes an article from a video title and its transcript
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, title: &str, transcript: &str) -> Result<String, GenerateError>;
}
