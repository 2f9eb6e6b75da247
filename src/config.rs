use anyhow::{Context, Result};
use serde::Deserialize;

use crate::room::RoomSettings;
use crate::speech::SpeechSettings;
use crate::synthesis::SynthesisSettings;
use crate::translation::TranslationSettings;

/// Environment variable prefix; nested keys use `__`, e.g.
/// `LINGUA_SERVICE__HTTP__PORT=9000`
pub const ENV_PREFIX: &str = "LINGUA";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub rooms: RoomSettings,
    pub speech: SpeechSettings,
    pub translation: TranslationSettings,
    pub synthesis: SynthesisSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "lingua-rooms".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl HttpConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Config {
    /// Load from an optional file (extension inferred) layered under
    /// `LINGUA_*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}
