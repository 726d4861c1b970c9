use config::{Config, ConfigError, Environment as EnvironmentSource, File};
use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub telegram: TelegramSettings,
    pub speech: SpeechSettings,
    pub audio: AudioSettings,
    pub confirmation: ConfirmationSettings,
    pub janitor: JanitorSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    /// Fixed language hint sent with every transcription request.
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioSettings {
    pub temp_dir: String,
    pub max_file_size_mb: u64,
    pub max_duration_secs: u32,
    pub max_queue_size: usize,
    pub requests_per_minute: usize,
    pub min_free_space_gb: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationSettings {
    pub ttl_minutes: i64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JanitorSettings {
    pub max_age_secs: u64,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Layered load: `appsettings.{environment}` file first, then
    /// `APP`-prefixed environment variables on top.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let configuration = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .separator("__")
                    .list_separator(" "),
            )
            .build()?;

        configuration.try_deserialize()
    }
}
