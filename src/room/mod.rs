//! Room membership and ordered broadcast
//!
//! - `RoomRegistry::join` / `leave` / `on_disconnect` mutate membership
//! - `RoomRegistry::broadcast` fans an event out to a room's members
//! - `RoomRegistry::snapshot` / `stats` return immutable copies
//!
//! Mutations of one room are serialized by that room's lock; different rooms
//! mutate independently. A room exists in the registry exactly while it has
//! at least one participant.

mod registry;
mod room;

pub use registry::{JoinOutcome, LeaveOutcome, RegistryStats, RoomRegistry};
pub use room::{ParticipantInfo, RoomSettings, RoomSnapshot};
