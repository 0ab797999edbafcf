use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;

use lydskrift::application::services::TranscriptionService;
use lydskrift::infrastructure::audio::WhisperRecognizer;
use lydskrift::infrastructure::media::YtDlpFetcher;
use lydskrift::infrastructure::observability::{init_tracing, TracingConfig};
use lydskrift::presentation::{create_router, AppState, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment)?;

    init_tracing(
        TracingConfig::new(environment.to_string(), settings.logging.enable_json),
        settings.server.port,
    );

    // Model weights are fetched and loaded once; every request shares the
    // handle read-only.
    let model_size = settings.model.size.clone();
    let recognizer = tokio::task::spawn_blocking(move || WhisperRecognizer::new(&model_size))
        .await??;
    let recognizer = Arc::new(recognizer);

    let media_fetcher = Arc::new(YtDlpFetcher::new(
        settings.extraction.binary.clone(),
        settings.extraction.audio_format.clone(),
        settings.extraction.audio_quality.clone(),
    ));

    let transcription_service = Arc::new(TranscriptionService::new(recognizer, media_fetcher));

    let router = create_router(AppState {
        transcription_service,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
