use config::{Config, Environment as EnvironmentSource, File};
use serde::Deserialize;

use super::Environment;

/// Service settings, layered from an optional `appsettings.<env>.toml` file
/// and `APP_`-prefixed environment variables. Every field has a default so
/// the service starts with neither present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub extraction: ExtractionSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn load(environment: Environment) -> Result<Self, config::ConfigError> {
        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(EnvironmentSource::with_prefix("APP").separator("_"))
            .build()?;

        configuration.try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Whisper model size ("tiny", "base", "small", ...) or a full
    /// Hugging Face repository id.
    pub size: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            size: "base".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub binary: String,
    pub audio_format: String,
    pub audio_quality: String,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { enable_json: false }
    }
}
