use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::conversation::LanguagePair;

/// Input to a translation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateParams {
    pub text: String,
    pub from: String,
    pub to: String,

    /// Preceding conversation text, for providers that use it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TranslateParams {
    pub fn new(text: impl Into<String>, languages: &LanguagePair) -> Self {
        Self {
            text: text.into(),
            from: languages.source.clone(),
            to: languages.target.clone(),
            context: None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.from.eq_ignore_ascii_case(&self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translated_text: String,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    pub detected_language: Option<String>,

    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl TranslationResponse {
    /// Response for a same-language request: the text itself, full confidence
    pub fn passthrough(params: &TranslateParams) -> Self {
        Self {
            translated_text: params.text.clone(),
            confidence: 1.0,
            detected_language: Some(params.from.clone()),
            alternatives: Vec::new(),
        }
    }
}

/// A single external translation service
#[async_trait::async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    async fn translate(&self, params: &TranslateParams) -> Result<TranslationResponse>;
}
