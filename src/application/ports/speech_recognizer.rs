use std::path::Path;

/// Speech-to-text inference over an audio file on disk.
///
/// Implementations are CPU-bound and synchronous; callers run them on the
/// blocking thread pool so the request dispatcher never stalls behind a
/// model forward pass.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe_file(&self, path: &Path) -> Result<String, SpeechRecognizerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechRecognizerError {
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("audio file io failed: {0}")]
    Io(#[from] std::io::Error),
}
