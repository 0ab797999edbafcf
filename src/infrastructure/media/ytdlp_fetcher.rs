use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{MediaFetcher, MediaFetchError};

/// Audio extraction through the external `yt-dlp` tool.
///
/// The tool picks the best available audio stream, transcodes it to the
/// configured format and quality, and writes `audio.<format>` into the
/// destination directory. It can exit cleanly without producing a file
/// (private, removed, or geo-blocked sources), so the output path is
/// verified before returning.
pub struct YtDlpFetcher {
    binary: String,
    audio_format: String,
    audio_quality: String,
}

impl YtDlpFetcher {
    pub fn new(binary: String, audio_format: String, audio_quality: String) -> Self {
        Self {
            binary,
            audio_format,
            audio_quality,
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_audio(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, MediaFetchError> {
        let output_template = dest_dir.join("audio.%(ext)s");
        let expected_path = dest_dir.join(format!("audio.{}", self.audio_format));

        tracing::info!(url = %url, dest = %dest_dir.display(), "Extracting audio");

        let output = Command::new(&self.binary)
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--no-playlist")
            .arg("--output")
            .arg(&output_template)
            .arg(url)
            .output()
            .await
            .map_err(|e| MediaFetchError::Spawn(format!("{}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(url = %url, stderr = %stderr, "Extractor exited with failure");
            return Err(classify_extractor_failure(&stderr));
        }

        match tokio::fs::try_exists(&expected_path).await {
            Ok(true) => {
                tracing::debug!(path = %expected_path.display(), "Audio extracted");
                Ok(expected_path)
            }
            _ => Err(MediaFetchError::NoAudioProduced(format!(
                "extractor exited cleanly but {} is missing",
                expected_path.display()
            ))),
        }
    }
}

/// Maps the extractor's stderr onto typed failure variants, so status-code
/// mapping upstream never touches raw tool output. Pattern matching on
/// tool messages is inherently brittle across versions and locales; this
/// is the single place it happens.
pub fn classify_extractor_failure(stderr: &str) -> MediaFetchError {
    let lowered = stderr.to_lowercase();
    let summary = summarize(stderr);

    if lowered.contains("403")
        || lowered.contains("forbidden")
        || lowered.contains("private")
        || lowered.contains("sign in")
    {
        MediaFetchError::AccessDenied(summary)
    } else if lowered.contains("404")
        || lowered.contains("unavailable")
        || lowered.contains("not available")
        || lowered.contains("removed")
        || lowered.contains("does not exist")
    {
        MediaFetchError::NotFound(summary)
    } else if lowered.contains("unable to download") {
        MediaFetchError::AccessDenied(summary)
    } else {
        MediaFetchError::ExtractionFailed(summary)
    }
}

/// Last non-empty stderr line, which is where yt-dlp puts its error.
fn summarize(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("extractor produced no diagnostics")
        .trim()
        .to_string()
}
