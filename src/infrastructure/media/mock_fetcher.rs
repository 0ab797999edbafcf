use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{MediaFetcher, MediaFetchError};

/// Scripted outcome for a [`MockMediaFetcher`] call.
pub enum MockFetchOutcome {
    /// Write the given bytes as `audio.mp3` in the destination directory.
    ProduceAudio(Vec<u8>),
    AccessDenied,
    NotFound,
    /// Exit "cleanly" without writing anything.
    NoOutput,
    Fail(String),
}

/// Test double for the extraction tool. Records every destination
/// directory so tests can assert the temp tree was removed afterwards.
pub struct MockMediaFetcher {
    outcome: MockFetchOutcome,
    seen_dirs: Mutex<Vec<PathBuf>>,
}

impl MockMediaFetcher {
    pub fn new(outcome: MockFetchOutcome) -> Self {
        Self {
            outcome,
            seen_dirs: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_dirs(&self) -> Vec<PathBuf> {
        self.seen_dirs
            .lock()
            .map(|dirs| dirs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaFetcher for MockMediaFetcher {
    async fn fetch_audio(&self, _url: &str, dest_dir: &Path) -> Result<PathBuf, MediaFetchError> {
        if let Ok(mut dirs) = self.seen_dirs.lock() {
            dirs.push(dest_dir.to_path_buf());
        }

        match &self.outcome {
            MockFetchOutcome::ProduceAudio(data) => {
                let path = dest_dir.join("audio.mp3");
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| MediaFetchError::ExtractionFailed(e.to_string()))?;
                Ok(path)
            }
            MockFetchOutcome::AccessDenied => Err(MediaFetchError::AccessDenied(
                "HTTP Error 403: Forbidden".to_string(),
            )),
            MockFetchOutcome::NotFound => {
                Err(MediaFetchError::NotFound("Video unavailable".to_string()))
            }
            MockFetchOutcome::NoOutput => Err(MediaFetchError::NoAudioProduced(format!(
                "extractor exited cleanly but {} is missing",
                dest_dir.join("audio.mp3").display()
            ))),
            MockFetchOutcome::Fail(message) => {
                Err(MediaFetchError::ExtractionFailed(message.clone()))
            }
        }
    }
}
