/// A single audio source for one transcription request.
///
/// The presentation layer enforces the exactly-one-of invariant before
/// constructing this, so a request with both or neither input never
/// reaches the application layer.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// A video-sharing-site URL to download and extract audio from.
    RemoteUrl(String),
    /// Raw audio bytes uploaded with the request.
    UploadedFile { filename: String, data: Vec<u8> },
}

impl AudioSource {
    pub fn kind(&self) -> &'static str {
        match self {
            AudioSource::RemoteUrl(_) => "url",
            AudioSource::UploadedFile { .. } => "file",
        }
    }
}
