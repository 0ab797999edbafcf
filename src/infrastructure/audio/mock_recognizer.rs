use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::ports::{SpeechRecognizer, SpeechRecognizerError};

/// Test double that echoes the staged file's contents back as the
/// transcript and records every path it was handed, so tests can assert
/// both transcript correctness and temp-file cleanup.
pub struct MockSpeechRecognizer {
    fail_with: Option<String>,
    seen_paths: Mutex<Vec<PathBuf>>,
}

impl MockSpeechRecognizer {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    /// A recognizer whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl Default for MockSpeechRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for MockSpeechRecognizer {
    fn transcribe_file(&self, path: &Path) -> Result<String, SpeechRecognizerError> {
        if let Ok(mut paths) = self.seen_paths.lock() {
            paths.push(path.to_path_buf());
        }

        if let Some(message) = &self.fail_with {
            return Err(SpeechRecognizerError::InferenceFailed(message.clone()));
        }

        let data = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}
