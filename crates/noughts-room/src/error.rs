//! Error types for the room layer.

use noughts_protocol::{ConnectionId, MoveRejection, ProtocolError, RoomId, ServerEvent};

/// Errors that can occur during registry or match operations.
///
/// None of these are fatal: each one is reported to the requesting
/// connection only and leaves every room untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this id.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A live room already uses the requested id.
    #[error("room id {0} already exists, choose another or join it")]
    RoomIdTaken(RoomId),

    /// The room already has two participants.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The move was refused; the board is unchanged.
    #[error("invalid move: {0}")]
    InvalidMove(MoveRejection),

    /// The connection is already a participant somewhere.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomId),

    /// The connection is not a participant of this room.
    #[error("{0} is not in room {1}")]
    NotInRoom(ConnectionId, RoomId),

    /// The room id supplied by the client is malformed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Every generated id collided with a live room.
    #[error("could not generate a free room id after {attempts} attempts")]
    IdGenerationExhausted { attempts: usize },

    /// The room's actor stopped before answering.
    #[error("room {0} is no longer available")]
    Unavailable(RoomId),
}

impl RoomError {
    /// The event that reports this error to the requesting connection.
    pub fn to_event(&self) -> ServerEvent {
        let code = match self {
            Self::RoomFull(_) => return ServerEvent::RoomFull,
            Self::InvalidMove(reason) => {
                return ServerEvent::InvalidMove { reason: *reason };
            }
            Self::NotFound(_) => 404,
            Self::RoomIdTaken(_) | Self::AlreadyInRoom(..) => 409,
            Self::NotInRoom(..) | Self::Protocol(_) => 400,
            Self::IdGenerationExhausted { .. } | Self::Unavailable(_) => 500,
        };
        ServerEvent::Error {
            code,
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(raw: &str) -> RoomId {
        RoomId::parse(raw).unwrap()
    }

    #[test]
    fn test_room_full_maps_to_room_full_event() {
        assert_eq!(RoomError::RoomFull(rid("A1")).to_event(), ServerEvent::RoomFull);
    }

    #[test]
    fn test_invalid_move_carries_reason() {
        let event = RoomError::InvalidMove(MoveRejection::NotYourTurn).to_event();
        assert_eq!(
            event,
            ServerEvent::InvalidMove {
                reason: MoveRejection::NotYourTurn
            }
        );
    }

    #[test]
    fn test_error_codes() {
        let code_of = |err: RoomError| match err.to_event() {
            ServerEvent::Error { code, .. } => code,
            other => panic!("expected Error, got {other:?}"),
        };
        assert_eq!(code_of(RoomError::NotFound(rid("A1"))), 404);
        assert_eq!(code_of(RoomError::RoomIdTaken(rid("A1"))), 409);
        assert_eq!(
            code_of(RoomError::AlreadyInRoom(ConnectionId::new(1), rid("A1"))),
            409
        );
        assert_eq!(
            code_of(ProtocolError::InvalidRoomId("?".into()).into()),
            400
        );
        assert_eq!(code_of(RoomError::IdGenerationExhausted { attempts: 10 }), 500);
        assert_eq!(code_of(RoomError::Unavailable(rid("A1"))), 500);
    }

    #[test]
    fn test_not_found_message_names_room() {
        match RoomError::NotFound(rid("zz9")).to_event() {
            ServerEvent::Error { message, .. } => assert!(message.contains("ZZ9")),
            other => panic!("expected Error, got {other:?}"),
        }
    }
}
