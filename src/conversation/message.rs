use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source/target languages, fixed onto a message when it is created
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Same language on both sides: no translation needed
    pub fn is_identity(&self) -> bool {
        self.source.eq_ignore_ascii_case(&self.target)
    }
}

/// A unit of spoken or typed content with an optional translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub source_lang: String,
    pub target_lang: String,
    pub author_id: String,
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_content: Option<String>,

    /// Translation confidence (0.0 to 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    /// Set when translation failed; the original content stays visible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

impl Message {
    pub fn new(content: impl Into<String>, languages: &LanguagePair, author_id: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            content: content.into(),
            source_lang: languages.source.clone(),
            target_lang: languages.target.clone(),
            author_id: author_id.into(),
            timestamp: Utc::now(),
            translated_content: None,
            confidence: None,
            translation_error: None,
        }
    }

    pub fn languages(&self) -> LanguagePair {
        LanguagePair::new(self.source_lang.clone(), self.target_lang.clone())
    }

    /// Translated, or failed: either way the correlator is done with it
    pub fn is_settled(&self) -> bool {
        self.translated_content.is_some() || self.translation_error.is_some()
    }
}
