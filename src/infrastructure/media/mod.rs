mod mock_fetcher;
mod ytdlp_fetcher;

pub use mock_fetcher::{MockFetchOutcome, MockMediaFetcher};
pub use ytdlp_fetcher::{classify_extractor_failure, YtDlpFetcher};
