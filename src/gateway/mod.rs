//! Real-time connection gateway
//!
//! Clients connect over a WebSocket at `/ws` and exchange JSON events tagged
//! by `type`:
//! - Inbound: join, leave, send, typing_start, typing_stop, translate_request
//! - Outbound: connected, message_new, user_joined, user_left, user_typing,
//!   user_stopped_typing, translation_complete, room_updated, error

mod messages;
mod router;
mod socket;

pub use messages::{ClientEvent, ServerEvent};
pub use router::Gateway;
pub use socket::{ws_handler, ConnectParams};
