//! Translation capability and result correlation
//!
//! - `TranslationProvider`: one external translation service
//! - `Translator`: ordered provider chain with per-attempt timeout; raises
//!   `TranslationError::ServiceUnavailable` only once every provider failed
//! - `TranslationCorrelator`: creates messages optimistically and applies
//!   each message's translation result exactly once, keyed by message id

mod correlator;
mod fallback;
mod libre;
mod provider;

pub use correlator::{
    CorrelatorEvent, TranslationCorrelator, TranslationOutcome, TranslationRequest,
    TranslationStatus,
};
pub use fallback::{ProviderConfig, TranslationSettings, Translator};
pub use libre::LibreTranslateProvider;
pub use provider::{TranslateParams, TranslationProvider, TranslationResponse};
