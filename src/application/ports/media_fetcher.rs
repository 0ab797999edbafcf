use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Downloads audio from a remote video-site URL into `dest_dir` and returns
/// the path of the extracted file.
///
/// Implementations must verify the output file actually exists before
/// returning, since external extraction tools can exit cleanly while
/// producing nothing.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_audio(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, MediaFetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaFetchError {
    #[error("access to the source was denied: {0}")]
    AccessDenied(String),
    #[error("source not found: {0}")]
    NotFound(String),
    #[error("extractor produced no audio output: {0}")]
    NoAudioProduced(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("failed to launch extractor: {0}")]
    Spawn(String),
}

impl MediaFetchError {
    /// True when the failure is attributable to the remote source itself
    /// (private, removed, geo-blocked, or silently empty) rather than to
    /// this service.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            MediaFetchError::AccessDenied(_)
                | MediaFetchError::NotFound(_)
                | MediaFetchError::NoAudioProduced(_)
        )
    }
}
