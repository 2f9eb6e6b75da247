//! Conversation messages and the per-client message log

mod log;
mod message;

pub use log::{ApplyError, ConversationLog};
pub use message::{LanguagePair, Message};
