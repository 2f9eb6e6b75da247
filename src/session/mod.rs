//! Connection identities
//!
//! A `Session` is created when a transport connects and destroyed when it
//! disconnects. The `SessionRegistry` is the owned store of live sessions;
//! room membership itself lives in the room registry and is mirrored here
//! only as the session's current room id.

mod registry;
mod session;

pub use registry::SessionRegistry;
pub use session::{Outbox, Session, SessionId};
