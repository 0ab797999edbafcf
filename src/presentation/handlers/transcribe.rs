use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::ports::{MediaFetcher, SpeechRecognizer};
use crate::application::services::TranscriptionError;
use crate::domain::AudioSource;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// POST /transcribe: multipart form with exactly one of `youtube_url`
/// (text) or `audio_file` (binary).
///
/// Empty-string values count as absent for both fields; some HTTP client
/// tooling submits an empty string instead of omitting the field.
#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler<R, M>(
    State(state): State<AppState<R, M>>,
    mut multipart: Multipart,
) -> impl IntoResponse
where
    R: SpeechRecognizer + 'static,
    M: MediaFetcher + 'static,
{
    let mut youtube_url: Option<String> = None;
    let mut audio_file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart form");
                return unprocessable(format!("Failed to read multipart form: {}", e));
            }
        };

        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("youtube_url") => {
                let text = match field.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        return unprocessable(format!("Failed to read 'youtube_url': {}", e));
                    }
                };
                if !text.trim().is_empty() {
                    youtube_url = Some(text);
                }
            }
            Some("audio_file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = match field.bytes().await {
                    Ok(d) => d,
                    Err(e) => {
                        return unprocessable(format!("Failed to read 'audio_file': {}", e));
                    }
                };
                if !data.is_empty() {
                    audio_file = Some((filename, data.to_vec()));
                }
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown form field");
            }
        }
    }

    let source = match (youtube_url, audio_file) {
        (None, None) => {
            return unprocessable(
                "You must provide either a 'youtube_url' or an 'audio_file'.".to_string(),
            );
        }
        (Some(_), Some(_)) => {
            return unprocessable(
                "Please provide either a 'youtube_url' or an 'audio_file', not both.".to_string(),
            );
        }
        (Some(url), None) => AudioSource::RemoteUrl(url),
        (None, Some((filename, data))) => AudioSource::UploadedFile { filename, data },
    };

    tracing::debug!(kind = source.kind(), "Dispatching transcription");

    match state.transcription_service.transcribe(source).await {
        Ok(transcript) => {
            tracing::info!(chars = transcript.text().len(), "Transcription succeeded");
            (
                StatusCode::OK,
                Json(TranscribeResponse {
                    transcript: transcript.into_text(),
                }),
            )
                .into_response()
        }
        Err(TranscriptionError::SourceUnavailable(reason)) => {
            tracing::warn!(reason = %reason, "Source unavailable");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    detail: "Could not retrieve audio from the given source. It may be private, \
                             removed, or access-restricted."
                        .to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Transcription failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: format!("An unexpected error occurred during transcription: {}", e),
                }),
            )
                .into_response()
        }
    }
}

fn unprocessable(detail: String) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse { detail }),
    )
        .into_response()
}
