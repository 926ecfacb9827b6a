use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// Config pointing every path into the temp directory, with no API keys
fn write_config(dir: &Path) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let yaml = format!(
        "storage:\n  media_root: {}\n  database_path: {}\nmedia:\n  yt_dlp_path: /nonexistent/yt-dlp\n",
        dir.join("media").display(),
        dir.join("blog.db").display(),
    );
    fs_err::write(&config_path, yaml).unwrap();
    config_path
}

fn blogscribe(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("blogscribe").unwrap();
    cmd.env("BLOGSCRIBE_CONFIG", config_path)
        .env_remove("ASSEMBLYAI_API_KEY")
        .env_remove("GROQ_API_KEY")
        .env_remove("BLOGSCRIBE_USER");
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("blogscribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("posts"));
}

#[test]
fn test_generate_rejects_non_youtube_link() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    blogscribe(&config_path)
        .args(["generate", "https://vimeo.com/123", "--user", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provided link is not a valid YouTube URL"));

    blogscribe(&config_path)
        .args(["posts", "--user", "alice", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));

    // Rejected before the download stage, so no audio directory exists
    assert!(!dir.path().join("media").join("audio_files").exists());
}

#[test]
fn test_generate_reports_unreachable_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    blogscribe(&config_path)
        .args(["generate", "https://youtu.be/abc123", "--user", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch YouTube title"));
}

#[test]
fn test_config_show_masks_missing_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    blogscribe(&config_path)
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/nonexistent/yt-dlp"))
        .stdout(predicate::str::contains("(not set)"));
}
