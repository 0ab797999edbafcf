use std::io::Write;
use std::sync::Arc;

use crate::application::ports::{
    MediaFetcher, MediaFetchError, SpeechRecognizer, SpeechRecognizerError,
};
use crate::domain::{AudioSource, Transcript};

/// Turns one audio source into its transcript.
///
/// Owns the temporary-resource lifecycle for a request: an uploaded file is
/// staged in a named temp file, a URL source in a temp directory covering
/// both the downloaded and extracted artifacts. Both are RAII guards, so
/// removal holds on every exit path.
pub struct TranscriptionService<R, M>
where
    R: SpeechRecognizer,
    M: MediaFetcher,
{
    recognizer: Arc<R>,
    media_fetcher: Arc<M>,
}

impl<R, M> TranscriptionService<R, M>
where
    R: SpeechRecognizer + 'static,
    M: MediaFetcher,
{
    pub fn new(recognizer: Arc<R>, media_fetcher: Arc<M>) -> Self {
        Self {
            recognizer,
            media_fetcher,
        }
    }

    pub async fn transcribe(&self, source: AudioSource) -> Result<Transcript, TranscriptionError> {
        match source {
            AudioSource::RemoteUrl(url) => self.transcribe_url(&url).await,
            AudioSource::UploadedFile { filename, data } => {
                tracing::debug!(filename = %filename, bytes = data.len(), "Transcribing uploaded file");
                self.transcribe_upload(data).await
            }
        }
    }

    async fn transcribe_upload(&self, data: Vec<u8>) -> Result<Transcript, TranscriptionError> {
        let recognizer = Arc::clone(&self.recognizer);

        // Staging and inference are both blocking; the temp file lives and
        // dies inside the closure so cleanup survives panics too.
        let text = tokio::task::spawn_blocking(move || -> Result<String, TranscriptionError> {
            let mut staged =
                tempfile::NamedTempFile::new().map_err(TranscriptionError::TempResource)?;
            staged
                .write_all(&data)
                .map_err(TranscriptionError::TempResource)?;
            staged.flush().map_err(TranscriptionError::TempResource)?;

            recognizer
                .transcribe_file(staged.path())
                .map_err(TranscriptionError::Recognition)
        })
        .await
        .map_err(|e| TranscriptionError::Internal(e.to_string()))??;

        Ok(Transcript::new(text))
    }

    async fn transcribe_url(&self, url: &str) -> Result<Transcript, TranscriptionError> {
        tracing::debug!(url = %url, "Fetching audio from remote source");

        let staging_dir = tempfile::tempdir().map_err(TranscriptionError::TempResource)?;

        let audio_path = self
            .media_fetcher
            .fetch_audio(url, staging_dir.path())
            .await
            .map_err(|e| {
                if e.is_source_unavailable() {
                    TranscriptionError::SourceUnavailable(e.to_string())
                } else {
                    TranscriptionError::Fetch(e)
                }
            })?;

        let recognizer = Arc::clone(&self.recognizer);
        let text = tokio::task::spawn_blocking(move || recognizer.transcribe_file(&audio_path))
            .await
            .map_err(|e| TranscriptionError::Internal(e.to_string()))?
            .map_err(TranscriptionError::Recognition)?;

        // staging_dir drops here, removing the downloaded and extracted
        // artifacts in one pass.
        Ok(Transcript::new(text))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("could not retrieve audio from the given source: {0}")]
    SourceUnavailable(String),
    #[error(transparent)]
    Fetch(MediaFetchError),
    #[error(transparent)]
    Recognition(SpeechRecognizerError),
    #[error("temporary storage failed: {0}")]
    TempResource(std::io::Error),
    #[error("transcription task failed: {0}")]
    Internal(String),
}
