use std::sync::Arc;

use crate::application::ports::{MediaFetcher, SpeechRecognizer};
use crate::application::services::TranscriptionService;

pub struct AppState<R, M>
where
    R: SpeechRecognizer,
    M: MediaFetcher,
{
    pub transcription_service: Arc<TranscriptionService<R, M>>,
}

impl<R, M> Clone for AppState<R, M>
where
    R: SpeechRecognizer,
    M: MediaFetcher,
{
    fn clone(&self) -> Self {
        Self {
            transcription_service: Arc::clone(&self.transcription_service),
        }
    }
}
