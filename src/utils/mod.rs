use tokio::process::Command;

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path, "--version").await {
        missing.push(format!("{} - required for YouTube metadata and audio download", yt_dlp_path));
    }

    // yt-dlp shells out to ffmpeg for --extract-audio
    if !check_command_available("ffmpeg", "-version").await {
        missing.push("ffmpeg - required to transcode downloaded audio".to_string());
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str, version_flag: &str) -> bool {
    Command::new(command)
        .arg(version_flag)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
