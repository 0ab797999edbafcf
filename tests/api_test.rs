use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use lydskrift::application::services::TranscriptionService;
use lydskrift::infrastructure::audio::MockSpeechRecognizer;
use lydskrift::infrastructure::media::{MockFetchOutcome, MockMediaFetcher};
use lydskrift::presentation::{create_router, AppState};

const BOUNDARY: &str = "lydskrift-test-boundary";

fn test_app(
    recognizer: Arc<MockSpeechRecognizer>,
    fetcher: Arc<MockMediaFetcher>,
) -> Router {
    let transcription_service = Arc::new(TranscriptionService::new(recognizer, fetcher));
    create_router(AppState {
        transcription_service,
    })
}

fn echo_app() -> Router {
    test_app(
        Arc::new(MockSpeechRecognizer::new()),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::ProduceAudio(
            b"downloaded audio".to_vec(),
        ))),
    )
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
    .into_bytes()
}

fn file_part(name: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
         filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    part.extend_from_slice(data);
    part.extend_from_slice(b"\r\n");
    part
}

fn multipart_body(parts: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(&part);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_transcribe(app: Router, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcribe")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn given_running_server_when_health_check_then_reports_api_running() {
    let response = echo_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "API is running");
}

#[tokio::test]
async fn given_neither_field_when_transcribe_then_returns_unprocessable() {
    let body = multipart_body(vec![]);
    let (status, json) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("youtube_url"));
}

#[tokio::test]
async fn given_both_fields_when_transcribe_then_returns_unprocessable() {
    let body = multipart_body(vec![
        text_part("youtube_url", "https://example.com/watch?v=abc"),
        file_part("audio_file", "clip.wav", b"some audio"),
    ]);
    let (status, json) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("not both"));
}

#[tokio::test]
async fn given_empty_file_field_when_transcribe_with_url_then_treated_as_url_only() {
    // Swagger-style clients submit an empty string for an omitted file.
    let body = multipart_body(vec![
        text_part("youtube_url", "https://example.com/watch?v=abc"),
        file_part("audio_file", "", b""),
    ]);
    let (status, json) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transcript"], "downloaded audio");
}

#[tokio::test]
async fn given_empty_url_and_no_file_when_transcribe_then_returns_unprocessable() {
    let body = multipart_body(vec![text_part("youtube_url", "")]);
    let (status, _) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn given_uploaded_file_when_transcribe_then_returns_transcript() {
    let body = multipart_body(vec![file_part(
        "audio_file",
        "clip.wav",
        b"hello from the fixture",
    )]);
    let (status, json) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transcript"], "hello from the fixture");
}

#[tokio::test]
async fn given_url_when_extraction_succeeds_then_returns_transcript() {
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=abc",
    )]);
    let (status, json) = post_transcribe(echo_app(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["transcript"], "downloaded audio");
}

#[tokio::test]
async fn given_access_denied_source_when_transcribe_then_returns_bad_request() {
    let app = test_app(
        Arc::new(MockSpeechRecognizer::new()),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::AccessDenied)),
    );
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=private",
    )]);
    let (status, json) = post_transcribe(app, body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("private") || detail.contains("access-restricted"));
}

#[tokio::test]
async fn given_extractor_produces_no_output_when_transcribe_then_returns_bad_request() {
    let app = test_app(
        Arc::new(MockSpeechRecognizer::new()),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput)),
    );
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=gone",
    )]);
    let (status, json) = post_transcribe(app, body).await;

    // Never a silent 200 with an empty transcript.
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("transcript").is_none());
}

#[tokio::test]
async fn given_extractor_internal_failure_when_transcribe_then_returns_server_error() {
    let app = test_app(
        Arc::new(MockSpeechRecognizer::new()),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::Fail(
            "ffmpeg postprocessing crashed".to_string(),
        ))),
    );
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=abc",
    )]);
    let (status, json) = post_transcribe(app, body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("ffmpeg postprocessing crashed"));
}

#[tokio::test]
async fn given_failing_recognizer_when_transcribe_then_returns_server_error_with_detail() {
    let app = test_app(
        Arc::new(MockSpeechRecognizer::failing("model exploded")),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput)),
    );
    let body = multipart_body(vec![file_part("audio_file", "clip.wav", b"audio")]);
    let (status, json) = post_transcribe(app, body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["detail"].as_str().unwrap().contains("model exploded"));
}

#[tokio::test]
async fn given_same_upload_twice_when_transcribe_then_transcripts_match() {
    let app = echo_app();
    let body = multipart_body(vec![file_part("audio_file", "clip.wav", b"idempotent input")]);

    let (first_status, first) = post_transcribe(app.clone(), body.clone()).await;
    let (second_status, second) = post_transcribe(app, body).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["transcript"], second["transcript"]);
}

#[tokio::test]
async fn given_successful_upload_when_request_completes_then_temp_file_is_removed() {
    let recognizer = Arc::new(MockSpeechRecognizer::new());
    let app = test_app(
        Arc::clone(&recognizer),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput)),
    );
    let body = multipart_body(vec![file_part("audio_file", "clip.wav", b"audio")]);
    let (status, _) = post_transcribe(app, body).await;
    assert_eq!(status, StatusCode::OK);

    let paths = recognizer.seen_paths();
    assert_eq!(paths.len(), 1);
    assert!(!paths[0].exists(), "staged upload must be deleted");
}

#[tokio::test]
async fn given_failed_inference_when_request_completes_then_temp_file_is_removed() {
    let recognizer = Arc::new(MockSpeechRecognizer::failing("boom"));
    let app = test_app(
        Arc::clone(&recognizer),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput)),
    );
    let body = multipart_body(vec![file_part("audio_file", "clip.wav", b"audio")]);
    let (status, _) = post_transcribe(app, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let paths = recognizer.seen_paths();
    assert_eq!(paths.len(), 1);
    assert!(!paths[0].exists(), "staged upload must be deleted on failure");
}

#[tokio::test]
async fn given_url_request_when_request_completes_then_temp_dir_is_removed() {
    let fetcher = Arc::new(MockMediaFetcher::new(MockFetchOutcome::ProduceAudio(
        b"downloaded audio".to_vec(),
    )));
    let app = test_app(Arc::new(MockSpeechRecognizer::new()), Arc::clone(&fetcher));
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=abc",
    )]);
    let (status, _) = post_transcribe(app, body).await;
    assert_eq!(status, StatusCode::OK);

    let dirs = fetcher.seen_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists(), "staging directory must be deleted");
}

#[tokio::test]
async fn given_failed_extraction_when_request_completes_then_temp_dir_is_removed() {
    let fetcher = Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput));
    let app = test_app(Arc::new(MockSpeechRecognizer::new()), Arc::clone(&fetcher));
    let body = multipart_body(vec![text_part(
        "youtube_url",
        "https://example.com/watch?v=gone",
    )]);
    let (status, _) = post_transcribe(app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let dirs = fetcher.seen_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists(), "staging directory must be deleted on failure");
}

#[tokio::test]
async fn given_concurrent_uploads_when_transcribe_then_each_gets_its_own_transcript() {
    let recognizer = Arc::new(MockSpeechRecognizer::new());
    let app = test_app(
        Arc::clone(&recognizer),
        Arc::new(MockMediaFetcher::new(MockFetchOutcome::NoOutput)),
    );

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let content = format!("spoken content number {i}");
            let body = multipart_body(vec![file_part("audio_file", "clip.wav", content.as_bytes())]);
            let (status, json) = post_transcribe(app, body).await;
            (content, status, json)
        }));
    }

    for handle in handles {
        let (content, status, json) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["transcript"], content.as_str());
    }

    // No cross-request temp-file collisions.
    let paths = recognizer.seen_paths();
    assert_eq!(paths.len(), 8);
    let unique: std::collections::HashSet<_> = paths.iter().collect();
    assert_eq!(unique.len(), 8);
}
