//! Wire protocol for Noughts.
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`], [`Envelope`],
//!   [`RoomId`], [`Symbol`], [`GameSnapshot`]): the values that travel
//!   between browser and server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values become
//!   frame bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientAction / Envelope) → Room (engine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use noughts_transport::ConnectionId;
pub use types::{
    BOARD_CELLS, Cell, ClientAction, Envelope, GameSnapshot, MAX_ROOM_ID_LEN, MoveRejection,
    Recipient, RoomId, ServerEvent, Symbol,
};
