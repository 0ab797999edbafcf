mod media_fetcher;
mod speech_recognizer;

pub use media_fetcher::{MediaFetcher, MediaFetchError};
pub use speech_recognizer::{SpeechRecognizer, SpeechRecognizerError};
