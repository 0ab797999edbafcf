pub mod audio_decoder;
mod mock_recognizer;
mod whisper_recognizer;

pub use mock_recognizer::MockSpeechRecognizer;
pub use whisper_recognizer::WhisperRecognizer;
