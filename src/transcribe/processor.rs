use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::TranscribeError;
use crate::config::TranscriptionConfig;

/// Wait between status checks, growing linearly up to a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial: Duration,
    pub step: Duration,
    pub max: Duration,
}

impl PollSchedule {
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.poll_initial_ms),
            step: Duration::from_millis(config.poll_step_ms),
            max: Duration::from_millis(config.poll_max_ms),
        }
    }

    /// Wait after the `check`-th status check (1-based)
    pub fn delay(&self, check: u32) -> Duration {
        let grown = self
            .initial
            .saturating_add(self.step.saturating_mul(check.saturating_sub(1)));
        grown.min(self.max)
    }
}

/// Job status as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
    #[serde(other)]
    Unknown,
}

/// Transcript resource returned by the status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResource {
    pub id: String,
    pub status: TranscriptStatus,
    pub text: Option<String>,
    pub error: Option<String>,
    pub audio_duration: Option<f64>,
}

/// Polls one transcript until the service reports a terminal status
pub struct TranscriptionProcessor<'a> {
    client: &'a Client,
    api_base: &'a str,
    api_key: &'a str,
    transcript_id: String,
    schedule: PollSchedule,
}

impl<'a> TranscriptionProcessor<'a> {
    pub fn new(
        client: &'a Client,
        api_base: &'a str,
        api_key: &'a str,
        transcript_id: String,
        schedule: PollSchedule,
    ) -> Self {
        Self {
            client,
            api_base,
            api_key,
            transcript_id,
            schedule,
        }
    }

    /// Wait for the transcript to complete
    pub async fn wait_for_completion(&self) -> Result<TranscriptResource, TranscribeError> {
        let start_time = Instant::now();
        let mut check_count = 0;

        loop {
            check_count += 1;

            let transcript = self.get_transcript().await?;

            match transcript.status {
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    tracing::debug!(
                        transcript_id = %self.transcript_id,
                        elapsed_secs = start_time.elapsed().as_secs(),
                        check = check_count,
                        "Transcription in progress"
                    );
                    sleep(self.schedule.delay(check_count)).await;
                }
                TranscriptStatus::Completed => {
                    tracing::info!(
                        transcript_id = %self.transcript_id,
                        elapsed_secs = start_time.elapsed().as_secs(),
                        "Transcription completed"
                    );
                    return Ok(transcript);
                }
                TranscriptStatus::Error => {
                    let failure_reason = transcript.error.as_deref().unwrap_or("Unknown error");
                    return Err(TranscribeError::Unavailable(format!(
                        "transcription job failed: {}",
                        failure_reason
                    )));
                }
                TranscriptStatus::Unknown => {
                    return Err(TranscribeError::Unavailable(
                        "unexpected transcription job status".to_string(),
                    ));
                }
            }
        }
    }

    async fn get_transcript(&self) -> Result<TranscriptResource, TranscribeError> {
        let url = format!("{}/v2/transcript/{}", self.api_base, self.transcript_id);

        let response = self
            .client
            .get(&url)
            .header("authorization", self.api_key)
            .send()
            .await
            .map_err(|e| TranscribeError::Unavailable(format!("status check failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Unavailable(format!(
                "status check failed: HTTP {} {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TranscribeError::Unavailable(format!("invalid status response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_schedule_grows_to_ceiling() {
        let schedule = PollSchedule::from_config(&TranscriptionConfig::default());

        assert_eq!(schedule.delay(1), Duration::from_secs(3));
        assert_eq!(schedule.delay(2), Duration::from_secs(5));
        assert_eq!(schedule.delay(5), Duration::from_secs(11));
        assert_eq!(schedule.delay(100), Duration::from_secs(30));

        let huge = PollSchedule {
            initial: Duration::from_millis(u64::MAX),
            step: Duration::from_millis(u64::MAX),
            max: Duration::from_secs(30),
        };
        assert_eq!(huge.delay(1), Duration::from_secs(30));
        assert_eq!(huge.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let resource: TranscriptResource =
            serde_json::from_str(r#"{"id":"t1","status":"archived"}"#).unwrap();
        assert_eq!(resource.status, TranscriptStatus::Unknown);
        assert!(resource.text.is_none());
    }
}
