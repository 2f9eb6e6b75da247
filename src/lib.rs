pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod http;
pub mod room;
pub mod session;
pub mod speech;
pub mod synthesis;
pub mod translation;

pub use client::{ClientPipeline, PipelineEvent, PipelineSettings};
pub use config::Config;
pub use conversation::{ConversationLog, LanguagePair, Message};
pub use error::{GatewayError, RoomError, SpeechErrorKind, SynthesisError, TranslationError};
pub use gateway::{ClientEvent, Gateway, ServerEvent};
pub use http::{create_router, AppState};
pub use room::{RoomRegistry, RoomSettings, RoomSnapshot};
pub use session::{Session, SessionId, SessionRegistry};
pub use speech::{SpeechCapability, SpeechController, SpeechMachine, SpeechSettings, SpeechStatus};
pub use synthesis::{SynthesisCapability, SynthesisQueue, SynthesisSettings};
pub use translation::{TranslationCorrelator, TranslationProvider, Translator};
