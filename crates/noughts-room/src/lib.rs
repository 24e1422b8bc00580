//! Rooms for Noughts.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! board, participants, and turn. The registry creates and deletes rooms
//! and enforces one room per connection.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/deletes rooms, routes connections
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Room`], [`Board`]: the game state a room owns
//! - [`engine`]: the pure join/move/reset/leave rules

mod board;
pub mod engine;
mod error;
mod registry;
mod room;
mod state;

pub use board::{Board, TRIPLES};
pub use engine::Notice;
pub use error::RoomError;
pub use registry::{IdGenerator, MAX_ID_ATTEMPTS, ROOM_ID_LEN, RandomIds, RoomRegistry};
pub use room::{ParticipantSender, RoomHandle, RoomInfo};
pub use state::{Participant, ROOM_CAPACITY, Room, RoomPhase};
