//! # Noughts
//!
//! A real-time two-player noughts-and-crosses server.
//!
//! Browsers connect over WebSocket, create or join a room by its short id,
//! and the server keeps the authoritative board: it assigns symbols,
//! validates every move, detects wins and draws, and broadcasts each
//! transition to both players.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn start() -> Result<(), NoughtsError> {
//! let config = ServerConfig::from_env()?;
//! let server = NoughtsServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::NoughtsError;
pub use server::{NoughtsServer, NoughtsServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{ConfigError, NoughtsError, NoughtsServer, NoughtsServerBuilder, ServerConfig};
    pub use noughts_protocol::{
        ClientAction, Codec, ConnectionId, Envelope, GameSnapshot, JsonCodec, MoveRejection,
        RoomId, ServerEvent, Symbol,
    };
    pub use noughts_room::{IdGenerator, RandomIds, RoomRegistry};
}
