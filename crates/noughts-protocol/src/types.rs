//! Core protocol types: what clients send, what the server sends back,
//! and the identity types both sides share.
//!
//! Every enum that travels on the wire is internally tagged with a
//! `"type"` field, e.g. `{ "type": "JoinRoom", "room_id": "K3Z9Q" }`,
//! which is the easiest shape to switch on from JavaScript.

use std::fmt;

use noughts_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Longest room identifier a client may choose.
pub const MAX_ROOM_ID_LEN: usize = 16;

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Canonical room identifier.
///
/// Room identifiers are case-insensitive tokens. The canonical form is
/// upper-case ASCII alphanumerics, and every `RoomId` value is already
/// canonical, so two rooms compare equal exactly when their ids do.
///
/// Deserialization goes through [`RoomId::parse`], so an invalid id can
/// never be smuggled in through serde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Normalizes a raw token into its canonical form.
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomId`] when the trimmed token is
    /// empty, longer than [`MAX_ROOM_ID_LEN`], or contains anything other
    /// than ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_ROOM_ID_LEN
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidRoomId(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Symbol, Cell, GameSnapshot
// ---------------------------------------------------------------------------

/// One of the two marks a participant plays with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Returns the opposing symbol.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// A board cell: empty (`null` on the wire) or holding a symbol.
pub type Cell = Option<Symbol>;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// The full state of a room's game as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Cells in row-major order, index 0 top-left, 8 bottom-right.
    pub board: [Cell; BOARD_CELLS],
    /// Symbol whose turn it is.
    pub current_turn: Symbol,
    /// Whether moves are currently accepted.
    pub active: bool,
}

impl GameSnapshot {
    /// An empty board, X to move, play not active.
    pub fn new() -> Self {
        Self {
            board: [None; BOARD_CELLS],
            current_turn: Symbol::X,
            active: false,
        }
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// MoveRejection
// ---------------------------------------------------------------------------

/// Why a move was refused. Serialized as the human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The room isn't active or has fewer than two participants.
    #[serde(rename = "not active")]
    NotActive,
    /// The mover's symbol doesn't match the current turn.
    #[serde(rename = "not your turn")]
    NotYourTurn,
    /// The index is outside `0..9` or the cell is occupied.
    #[serde(rename = "cell taken")]
    CellTaken,
    /// The requesting connection isn't a participant of the room.
    #[serde(rename = "not in this room")]
    NotInRoom,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotActive => "not active",
            Self::NotYourTurn => "not your turn",
            Self::CellTaken => "cell taken",
            Self::NotInRoom => "not in this room",
        };
        f.write_str(reason)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// Room identifiers arrive as raw strings and are normalized by the
/// server, so a malformed id is answered with an `Error` 400 naming the
/// id rather than failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// Create a room, optionally with a chosen id, and join it as X.
    /// `None` or a blank string asks the server to generate an id.
    CreateRoom {
        #[serde(default)]
        room_id: Option<String>,
    },

    /// Join an existing room by id.
    JoinRoom { room_id: String },

    /// Place the mover's symbol at `index` (0..9, row-major).
    /// Kept signed so out-of-range values still decode and get a
    /// proper rejection.
    MakeMove { room_id: String, index: i64 },

    /// Clear the board and start over with X to move.
    ResetGame { room_id: String },

    /// Leave the current room without closing the connection.
    LeaveRoom,

    /// Keep-alive. `client_time` is echoed back for RTT measurement.
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Everything the server tells clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A room was created for the requester.
    RoomCreated { room_id: RoomId },

    /// The requester joined a room and plays `symbol`.
    RoomJoined {
        room_id: RoomId,
        symbol: Symbol,
        state: GameSnapshot,
    },

    /// The room already has two participants.
    RoomFull,

    /// Full state after a change.
    GameStateUpdate { state: GameSnapshot },

    /// `winner` completed the triple `cells`.
    Win {
        winner: Symbol,
        cells: [usize; 3],
        state: GameSnapshot,
    },

    /// Board full with no winner.
    Draw { state: GameSnapshot },

    /// The requester's move was refused; nothing changed.
    InvalidMove { reason: MoveRejection },

    /// The other participant left; the room is paused.
    PlayerDisconnected { message: String },

    /// Informational text for display.
    Message { text: String },

    /// Answer to [`ClientAction::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A request failed. `code` follows HTTP conventions
    /// (400 bad request, 404 not found, 409 conflict, 500 internal).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Recipient, Envelope
// ---------------------------------------------------------------------------

/// Who receives a [`ServerEvent`] produced by the room layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection currently in the room.
    Room,
    /// One connection, normally the requester.
    Connection(ConnectionId),
}

/// An outbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection sequence number, starting at 1.
    pub seq: u64,
    /// Milliseconds since the connection was accepted.
    pub timestamp: u64,
    /// The event itself.
    pub event: ServerEvent,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -- RoomId -----------------------------------------------------------

    #[test]
    fn test_room_id_parse_upper_cases_and_trims() {
        let id = RoomId::parse("  ab12c ").unwrap();
        assert_eq!(id.as_str(), "AB12C");
    }

    #[test]
    fn test_room_id_parse_is_case_insensitive() {
        assert_eq!(RoomId::parse("lobby").unwrap(), RoomId::parse("LoBbY").unwrap());
    }

    #[test]
    fn test_room_id_parse_rejects_empty_and_blank() {
        assert!(RoomId::parse("").is_err());
        assert!(RoomId::parse("   ").is_err());
    }

    #[test]
    fn test_room_id_parse_rejects_punctuation() {
        let err = RoomId::parse("room-1").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidRoomId(raw) if raw == "room-1"));
    }

    #[test]
    fn test_room_id_parse_rejects_too_long() {
        let raw = "A".repeat(MAX_ROOM_ID_LEN + 1);
        assert!(RoomId::parse(&raw).is_err());
        assert!(RoomId::parse(&"A".repeat(MAX_ROOM_ID_LEN)).is_ok());
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::parse("k3z9q").unwrap()).unwrap();
        assert_eq!(json, r#""K3Z9Q""#);
    }

    #[test]
    fn test_room_id_deserialize_normalizes_and_validates() {
        let id: RoomId = serde_json::from_str(r#""k3z9q""#).unwrap();
        assert_eq!(id.as_str(), "K3Z9Q");
        assert!(serde_json::from_str::<RoomId>(r#""no way""#).is_err());
    }

    // -- Symbol, snapshot -------------------------------------------------

    #[test]
    fn test_symbol_other() {
        assert_eq!(Symbol::X.other(), Symbol::O);
        assert_eq!(Symbol::O.other(), Symbol::X);
    }

    #[test]
    fn test_snapshot_empty_cells_are_null() {
        let mut snap = GameSnapshot::new();
        snap.board[4] = Some(Symbol::X);
        let json = serde_json::to_value(&snap).unwrap();

        assert!(json["board"][0].is_null());
        assert_eq!(json["board"][4], "X");
        assert_eq!(json["board"].as_array().unwrap().len(), BOARD_CELLS);
    }

    // -- MoveRejection ----------------------------------------------------

    #[test]
    fn test_move_rejection_wire_text_matches_display() {
        for reason in [
            MoveRejection::NotActive,
            MoveRejection::NotYourTurn,
            MoveRejection::CellTaken,
            MoveRejection::NotInRoom,
        ] {
            let json = serde_json::to_value(reason).unwrap();
            assert_eq!(json, reason.to_string());
        }
    }

    // -- ClientAction -----------------------------------------------------

    #[test]
    fn test_create_room_without_id_field() {
        let action: ClientAction = serde_json::from_str(r#"{"type":"CreateRoom"}"#).unwrap();
        assert_eq!(action, ClientAction::CreateRoom { room_id: None });
    }

    #[test]
    fn test_make_move_accepts_negative_index() {
        let action: ClientAction =
            serde_json::from_str(r#"{"type":"MakeMove","room_id":"R","index":-1}"#).unwrap();
        assert!(matches!(action, ClientAction::MakeMove { index: -1, .. }));
    }

    #[test]
    fn test_make_move_missing_index_fails() {
        let result: Result<ClientAction, _> =
            serde_json::from_str(r#"{"type":"MakeMove","room_id":"R"}"#);
        assert!(result.is_err());
    }

    // -- ServerEvent ------------------------------------------------------

    #[test]
    fn test_room_joined_json_format() {
        let event = ServerEvent::RoomJoined {
            room_id: RoomId::parse("ab12c").unwrap(),
            symbol: Symbol::O,
            state: GameSnapshot::new(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "RoomJoined");
        assert_eq!(json["room_id"], "AB12C");
        assert_eq!(json["symbol"], "O");
        assert_eq!(json["state"]["current_turn"], "X");
    }

    #[test]
    fn test_win_json_format() {
        let event = ServerEvent::Win {
            winner: Symbol::X,
            cells: [0, 4, 8],
            state: GameSnapshot::new(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Win");
        assert_eq!(json["winner"], "X");
        assert_eq!(json["cells"], serde_json::json!([0, 4, 8]));
    }

    #[test]
    fn test_invalid_move_json_format() {
        let event = ServerEvent::InvalidMove {
            reason: MoveRejection::CellTaken,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "InvalidMove");
        assert_eq!(json["reason"], "cell taken");
    }

    #[test]
    fn test_room_full_is_bare_tag() {
        let json = serde_json::to_value(&ServerEvent::RoomFull).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "RoomFull" }));
    }

    #[test]
    fn test_envelope_round_trip() {
        let env = Envelope {
            seq: 7,
            timestamp: 1500,
            event: ServerEvent::Message {
                text: "Game has been reset!".into(),
            },
        };
        let bytes = serde_json::to_vec(&env).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(env, decoded);
    }
}
