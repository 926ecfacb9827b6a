use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioArtifact, AudioFormat, MediaResolver, ResolveError, SourceReference, AUDIO_SUBDIR};
use crate::config::Config;
use crate::Result;

/// YouTube resolver backed by yt-dlp
pub struct YtDlpResolver {
    yt_dlp_path: String,
    audio_dir: PathBuf,
    audio_format: AudioFormat,
    audio_quality: String,
}

impl YtDlpResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            yt_dlp_path: config.media.yt_dlp_path.clone(),
            audio_dir: config.storage.media_root.join(AUDIO_SUBDIR),
            audio_format: config.media.audio_format,
            audio_quality: config.media.audio_quality.clone(),
        }
    }

    /// Directory downloaded audio is written to
    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(info_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)
            .context("yt-dlp printed invalid JSON")?;

        Ok(info)
    }

    /// Arguments for a download that transcodes to a single codec and prints the content id
    fn download_args(&self, url: &str) -> Vec<String> {
        let template = self.audio_dir.join("%(id)s.%(ext)s");

        vec![
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.audio_format.as_str().to_string(),
            "--audio-quality".to_string(),
            self.audio_quality.clone(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            "--print".to_string(),
            "after_move:id".to_string(),
            "--no-simulate".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    /// Download and transcode audio, returning the artifact on disk
    async fn download_audio(&self, url: &str) -> Result<AudioArtifact> {
        // Safe to race: create_dir_all succeeds if another request created it first
        fs_err::create_dir_all(&self.audio_dir)
            .context("Failed to create audio directory")?;

        tracing::debug!("Downloading audio for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(self.download_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to download audio: {}", error.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = parse_content_id(&stdout)
            .ok_or_else(|| anyhow::anyhow!("yt-dlp did not report a content id"))?;

        let artifact = AudioArtifact::locate(&self.audio_dir, id, self.audio_format);
        if !artifact.path.is_file() {
            anyhow::bail!("Expected audio file is missing: {}", artifact.path.display());
        }

        Ok(artifact)
    }
}

/// Metadata-only lookup. `--` keeps the link from being read as an option.
fn info_args(url: &str) -> [&str; 5] {
    ["--dump-json", "--no-playlist", "--skip-download", "--", url]
}

/// The id printed by `--print after_move:id` is the last non-empty line
fn parse_content_id(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
}

/// Non-blank title from a `--dump-json` document
fn extract_title(info: &Value) -> Option<String> {
    info["title"]
        .as_str()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve_title(&self, reference: &SourceReference) -> std::result::Result<String, ResolveError> {
        let info = self
            .get_video_info(reference.as_str())
            .await
            .map_err(|e| ResolveError::MetadataUnavailable(format!("{:#}", e)))?;

        extract_title(&info)
            .ok_or_else(|| ResolveError::MetadataUnavailable("video has no title".to_string()))
    }

    async fn fetch_audio(&self, reference: &SourceReference) -> std::result::Result<AudioArtifact, ResolveError> {
        let artifact = self
            .download_audio(reference.as_str())
            .await
            .map_err(|e| ResolveError::DownloadFailed(format!("{:#}", e)))?;

        tracing::info!(path = %artifact.path.display(), "Downloaded audio");
        Ok(artifact)
    }
}
