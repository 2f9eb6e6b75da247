use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::libre::LibreTranslateProvider;
use super::provider::{TranslateParams, TranslationProvider, TranslationResponse};
use crate::error::TranslationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// Timeout for a single provider attempt
    pub timeout_secs: u64,

    /// Providers in fallback order
    pub providers: Vec<ProviderConfig>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Confidence reported for this provider's translations
    #[serde(default = "default_confidence")]
    pub default_confidence: f32,
}

fn default_confidence() -> f32 {
    0.9
}

/// Translation capability backed by an ordered chain of providers
pub struct Translator {
    providers: Vec<Arc<dyn TranslationProvider>>,
    attempt_timeout: Duration,
}

impl Translator {
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>, attempt_timeout: Duration) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    pub fn from_settings(settings: &TranslationSettings) -> Result<Self> {
        let mut providers: Vec<Arc<dyn TranslationProvider>> = Vec::new();
        for config in &settings.providers {
            providers.push(Arc::new(LibreTranslateProvider::new(config)?));
        }

        if providers.is_empty() {
            warn!("No translation providers configured; cross-language requests will fail");
        } else {
            info!(
                "Translation chain: {}",
                settings
                    .providers
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
        }

        Ok(Self::new(
            providers,
            Duration::from_secs(settings.timeout_secs),
        ))
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Translate `params`, trying each provider in order.
    ///
    /// Same-language requests return the text unchanged without calling any
    /// provider.
    pub async fn translate(
        &self,
        params: &TranslateParams,
    ) -> Result<TranslationResponse, TranslationError> {
        if params.is_identity() {
            return Ok(TranslationResponse::passthrough(params));
        }

        let mut attempts = 0;
        for provider in &self.providers {
            attempts += 1;
            match tokio::time::timeout(self.attempt_timeout, provider.translate(params)).await {
                Ok(Ok(mut response)) => {
                    response.confidence = response.confidence.clamp(0.0, 1.0);
                    if attempts > 1 {
                        info!(
                            "Translation {} -> {} served by fallback provider {}",
                            params.from,
                            params.to,
                            provider.name()
                        );
                    }
                    return Ok(response);
                }
                Ok(Err(e)) => {
                    warn!("Translation provider {} failed: {:#}", provider.name(), e);
                }
                Err(_) => {
                    warn!(
                        "Translation provider {} timed out after {:?}",
                        provider.name(),
                        self.attempt_timeout
                    );
                }
            }
        }

        Err(TranslationError::ServiceUnavailable { attempts })
    }
}
