//! Unified error type for the Noughts server.

use noughts_protocol::ProtocolError;
use noughts_room::RoomError;
use noughts_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad room id).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, invalid move).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use noughts_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Transport(_)));
        assert!(noughts_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomId("bad id".into());
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Protocol(_)));
        assert!(noughts_err.to_string().contains("bad id"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId::parse("A1").unwrap());
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Room(_)));
        assert!(noughts_err.to_string().contains("A1"));
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::InvalidValue {
            name: "PORT",
            value: "x".into(),
        };
        let noughts_err: NoughtsError = err.into();
        assert!(matches!(noughts_err, NoughtsError::Config(_)));
    }
}
