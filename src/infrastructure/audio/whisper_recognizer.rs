use std::path::Path;
use std::sync::Mutex;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{SpeechRecognizer, SpeechRecognizerError};

use super::audio_decoder::decode_file_to_pcm;

const MAX_DECODE_TOKENS: usize = 224;

/// Local Whisper inference on CPU with f32 weights.
///
/// Loaded once at startup and shared across requests. The decoder mutates
/// its KV cache during generation, so the model handle sits behind a mutex;
/// audio decoding still runs concurrently, only the forward passes are
/// serialized.
pub struct WhisperRecognizer {
    model: Mutex<m::model::Whisper>,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    mel_filters: Vec<f32>,
}

impl WhisperRecognizer {
    /// Loads model weights from the Hugging Face hub. `model` is either a
    /// bare size ("base", "small", ...) resolved to the matching
    /// `openai/whisper-*` repository, or a full repository id.
    pub fn new(model: &str) -> Result<Self, SpeechRecognizerError> {
        let model_id = if model.contains('/') {
            model.to_string()
        } else {
            format!("openai/whisper-{}", model)
        };
        let device = Device::Cpu;

        tracing::info!(model = %model_id, "Loading Whisper model");

        let api = Api::new().map_err(|e| SpeechRecognizerError::ModelLoadFailed(e.to_string()))?;
        let repo = api.repo(Repo::new(model_id, RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("config.json: {}", e)))?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(|e| {
            SpeechRecognizerError::ModelLoadFailed(format!("tokenizer.json: {}", e))
        })?;
        let weights_path = repo.get("model.safetensors").map_err(|e| {
            SpeechRecognizerError::ModelLoadFailed(format!("model.safetensors: {}", e))
        })?;

        let mel_repo = api.repo(Repo::new(
            "FL33TW00D-HF/whisper-base".to_string(),
            RepoType::Model,
        ));
        let mel_bytes_path = mel_repo.get("melfilters.bytes").map_err(|e| {
            SpeechRecognizerError::ModelLoadFailed(format!("melfilters.bytes: {}", e))
        })?;

        let config_contents = std::fs::read_to_string(&config_path)
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("read config: {}", e)))?;
        let config: Config = serde_json::from_str(&config_contents)
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("parse config: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("tokenizer: {}", e)))?;

        let mel_bytes = std::fs::read(&mel_bytes_path)
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("mel filters: {}", e)))?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        // m::DTYPE is f32: the fp16 fast path needs GPU hardware and this
        // service is CPU-only.
        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], m::DTYPE, &device)
                .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("weights: {}", e)))?
        };

        let model = m::model::Whisper::load(&vb, config.clone())
            .map_err(|e| SpeechRecognizerError::ModelLoadFailed(format!("model: {}", e)))?;

        tracing::info!("Whisper model loaded");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            mel_filters,
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe_file(&self, path: &Path) -> Result<String, SpeechRecognizerError> {
        let pcm = decode_file_to_pcm(path)?;

        // One mel spectrogram per 30-second window, padded at the tail.
        let mut mel_tensors = Vec::new();
        for chunk in pcm.chunks(m::N_SAMPLES) {
            let samples = if chunk.len() < m::N_SAMPLES {
                let mut padded = chunk.to_vec();
                padded.resize(m::N_SAMPLES, 0.0);
                padded
            } else {
                chunk.to_vec()
            };

            let mel_data = m::audio::pcm_to_mel(&self.config, &samples, &self.mel_filters);
            let n_mel = self.config.num_mel_bins;
            let n_frames = mel_data.len() / n_mel;

            let mel = Tensor::from_vec(mel_data, (1, n_mel, n_frames), &self.device)
                .map_err(|e| SpeechRecognizerError::InferenceFailed(format!("mel tensor: {}", e)))?;
            mel_tensors.push(mel);
        }

        let mut model = self
            .model
            .lock()
            .map_err(|e| SpeechRecognizerError::InferenceFailed(format!("model lock: {}", e)))?;

        let mut segments: Vec<String> = Vec::new();
        for (i, mel) in mel_tensors.iter().enumerate() {
            tracing::debug!(segment = i, "Transcribing audio segment");
            let text = decode_segment(&mut model, &self.tokenizer, &self.device, mel)?;
            if !text.is_empty() {
                segments.push(text);
            }
        }

        let transcript = segments.join(" ");
        tracing::info!(
            segments = segments.len(),
            chars = transcript.len(),
            "Transcription completed"
        );

        Ok(transcript)
    }
}

fn decode_segment(
    model: &mut m::model::Whisper,
    tokenizer: &Tokenizer,
    device: &Device,
    mel: &Tensor,
) -> Result<String, SpeechRecognizerError> {
    let sot_token = token_id(tokenizer, m::SOT_TOKEN)?;
    let transcribe_token = token_id(tokenizer, m::TRANSCRIBE_TOKEN)?;
    let no_timestamps_token = token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?;
    let eot_token = token_id(tokenizer, m::EOT_TOKEN)?;

    let audio_features = model
        .encoder
        .forward(mel, true)
        .map_err(|e| SpeechRecognizerError::InferenceFailed(format!("encoder: {}", e)))?;

    let mut tokens = vec![sot_token, transcribe_token, no_timestamps_token];
    let mut decoded_text = String::new();

    for _ in 0..MAX_DECODE_TOKENS {
        let token_tensor = Tensor::new(tokens.as_slice(), device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| SpeechRecognizerError::InferenceFailed(e.to_string()))?;

        let decoder_output = model
            .decoder
            .forward(&token_tensor, &audio_features, tokens.len() == 3)
            .map_err(|e| SpeechRecognizerError::InferenceFailed(format!("decoder: {}", e)))?;

        let logits = decoder_output
            .squeeze(0)
            .and_then(|t| model.decoder.final_linear(&t))
            .map_err(|e| SpeechRecognizerError::InferenceFailed(format!("linear: {}", e)))?;

        let next_token = logits
            .dim(0)
            .and_then(|seq_len| logits.get(seq_len - 1))
            .and_then(|last| last.argmax(0))
            .and_then(|t| t.to_scalar::<u32>())
            .map_err(|e| SpeechRecognizerError::InferenceFailed(e.to_string()))?;

        if next_token == eot_token {
            break;
        }

        tokens.push(next_token);

        if let Some(text) = tokenizer.id_to_token(next_token) {
            decoded_text.push_str(&text.replace("Ġ", " ").replace("▁", " "));
        }
    }

    model.reset_kv_cache();

    Ok(decoded_text.trim().to_string())
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, SpeechRecognizerError> {
    tokenizer
        .token_to_id(token)
        .ok_or_else(|| SpeechRecognizerError::InferenceFailed(format!("token not found: {}", token)))
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, SpeechRecognizerError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(SpeechRecognizerError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    let filters = bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    Ok(filters)
}
