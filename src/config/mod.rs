use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::extractors::AudioFormat;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "BLOGSCRIBE_CONFIG";

/// Environment variable holding the speech-to-text API key
pub const ASSEMBLYAI_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

/// Environment variable holding the language-model API key
pub const GROQ_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Where audio artifacts and the database live
    pub storage: StorageConfig,

    /// yt-dlp settings
    pub media: MediaConfig,

    /// Speech-to-text service settings
    pub transcription: TranscriptionConfig,

    /// Language-model service settings
    pub generation: GenerationConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; audio files go to `<media_root>/audio_files`
    pub media_root: PathBuf,

    /// SQLite database file
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Codec the downloaded audio is transcoded to
    pub audio_format: AudioFormat,

    /// Bitrate passed to `--audio-quality`
    pub audio_quality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub api_base: String,

    /// Fallback when ASSEMBLYAI_API_KEY is not set
    pub api_key: Option<String>,

    /// Language code (auto-detect if not specified)
    pub language_code: Option<String>,

    /// Wait before the first status check
    pub poll_initial_ms: u64,

    /// Added to the wait after every check
    pub poll_step_ms: u64,

    /// Upper bound for the wait between checks
    pub poll_max_ms: u64,

    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,

    /// Fallback when GROQ_API_KEY is not set
    pub api_key: Option<String>,

    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            database_path: PathBuf::from("blog.db"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            audio_format: AudioFormat::Mp3,
            audio_quality: "192K".to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.assemblyai.com".to_string(),
            api_key: None,
            language_code: None,
            poll_initial_ms: 3_000,
            poll_step_ms: 2_000,
            poll_max_ms: 30_000,
            request_timeout_secs: 300,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai".to_string(),
            api_key: None,
            model: "llama-3.3-70b-versatile".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            request_timeout_secs: 120,
        }
    }
}

impl TranscriptionConfig {
    /// API key from the environment, falling back to the config file
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(ASSEMBLYAI_KEY_ENV, self.api_key.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GenerationConfig {
    /// API key from the environment, falling back to the config file
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(GROQ_KEY_ENV, self.api_key.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A blank value on either side counts as unset
fn resolve_secret(env_var: &str, fallback: Option<&str>) -> Option<String> {
    let non_blank = |key: &str| {
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    };

    std::env::var(env_var)
        .ok()
        .and_then(|key| non_blank(&key))
        .or_else(|| fallback.and_then(non_blank))
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        // Current directory first, for easy local runs
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("blog-scribe").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.media.yt_dlp_path.trim().is_empty() {
            anyhow::bail!("media.yt_dlp_path must not be empty");
        }

        if self.generation.max_tokens == 0 {
            anyhow::bail!("generation.max_tokens must be greater than zero");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!(
                "generation.temperature must be between 0.0 and 2.0, got {}",
                self.generation.temperature
            );
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Server: {}:{}", self.server.host, self.server.port);
        println!("  Media Root: {}", self.storage.media_root.display());
        println!("  Database: {}", self.storage.database_path.display());
        println!("  yt-dlp: {}", self.media.yt_dlp_path);
        println!(
            "  Audio: {} @ {}",
            self.media.audio_format.as_str(),
            self.media.audio_quality
        );
        println!("  Transcription API: {}", self.transcription.api_base);
        println!(
            "  Transcription Key: {}",
            mask_secret(self.transcription.resolve_api_key().as_deref())
        );
        println!(
            "  Generation API: {} ({})",
            self.generation.api_base, self.generation.model
        );
        println!(
            "  Generation Key: {}",
            mask_secret(self.generation.resolve_api_key().as_deref())
        );
    }

    /// Point the user at the file to edit
    pub async fn interactive_setup(&self) -> Result<()> {
        println!("Edit the config file to change settings:");
        println!("  {}", Self::config_path()?.display());
        println!(
            "API keys are read from {} and {} before the file.",
            ASSEMBLYAI_KEY_ENV, GROQ_KEY_ENV
        );
        Ok(())
    }
}

fn mask_secret(secret: Option<&str>) -> String {
    let Some(key) = secret else {
        return "(not set)".to_string();
    };

    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        "****".to_string()
    } else {
        format!("****{}", chars[chars.len() - 4..].iter().collect::<String>())
    }
}
