mod audio_source;
mod transcript;

pub use audio_source::AudioSource;
pub use transcript::Transcript;
