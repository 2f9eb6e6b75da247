use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fallback::ProviderConfig;
use super::provider::{TranslateParams, TranslationProvider, TranslationResponse};

/// Provider speaking the LibreTranslate `/translate` JSON API
pub struct LibreTranslateProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    default_confidence: f32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    alternatives: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
    #[serde(default)]
    detected_language: Option<LibreDetectedLanguage>,
    #[serde(default)]
    alternatives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LibreDetectedLanguage {
    language: String,
}

impl LibreTranslateProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            name: config.name.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            default_confidence: config.default_confidence,
            client,
        })
    }
}

#[async_trait::async_trait]
impl TranslationProvider for LibreTranslateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, params: &TranslateParams) -> Result<TranslationResponse> {
        let url = format!("{}/translate", self.endpoint);
        let body = LibreRequest {
            q: &params.text,
            source: &params.from,
            target: &params.to,
            format: "text",
            alternatives: 3,
            api_key: self.api_key.as_deref(),
        };

        debug!("POST {} ({} -> {})", url, params.from, params.to);

        let response: LibreResponse = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.name))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.name))?
            .json()
            .await
            .with_context(|| format!("Invalid response from {}", self.name))?;

        // LibreTranslate reports no translation confidence; use the configured one
        Ok(TranslationResponse {
            translated_text: response.translated_text,
            confidence: self.default_confidence,
            detected_language: response.detected_language.map(|d| d.language),
            alternatives: response.alternatives,
        })
    }
}
