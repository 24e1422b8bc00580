//! Room data model and lifecycle phases.

use std::fmt;

use noughts_protocol::{ConnectionId, GameSnapshot, RoomId, Symbol};
use serde::{Deserialize, Serialize};

use crate::Board;

/// Maximum number of participants in a room.
pub const ROOM_CAPACITY: usize = 2;

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle, derived from its participants and
/// flags rather than stored.
///
/// ```text
/// Waiting ──join──→ Active ──win/draw──→ Finished
///    ↑                │  ↑                  │
///    │              leave └──────reset──────┘
///    │                ↓
///    └── (new room) Paused ──join──→ Active
/// ```
///
/// `Empty` only exists between a room being registered and its first
/// join; a room that empties afterwards is deleted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Empty,
    Waiting,
    Active,
    Finished,
    Paused,
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
            Self::Paused => write!(f, "Paused"),
        }
    }
}

// ---------------------------------------------------------------------------
// Participant, Room
// ---------------------------------------------------------------------------

/// A connection bound to a room with its assigned symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub connection: ConnectionId,
    pub symbol: Symbol,
}

/// Authoritative state of one game room.
///
/// Only the match engine mutates a room; everything else reads it through
/// the accessors or a [`GameSnapshot`].
#[derive(Debug, Clone)]
pub struct Room {
    pub(crate) id: RoomId,
    pub(crate) participants: Vec<Participant>,
    pub(crate) board: Board,
    pub(crate) turn: Symbol,
    pub(crate) active: bool,
    /// Set when a participant leaves and one remains.
    pub(crate) vacated: bool,
}

impl Room {
    /// A fresh room: nobody in it, empty board, X to move, inactive.
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            participants: Vec::with_capacity(ROOM_CAPACITY),
            board: Board::new(),
            turn: Symbol::X,
            active: false,
            vacated: false,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Looks up a participant by connection.
    pub fn participant(&self, connection: ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.connection == connection)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> Symbol {
        self.turn
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= ROOM_CAPACITY
    }

    /// The symbol a newcomer would get: whichever one nobody holds,
    /// preferring X.
    pub fn free_symbol(&self) -> Option<Symbol> {
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|s| self.participants.iter().all(|p| p.symbol != *s))
    }

    /// The `fullState` clients see.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: *self.board.cells(),
            current_turn: self.turn,
            active: self.active,
        }
    }

    pub fn phase(&self) -> RoomPhase {
        match self.participants.len() {
            0 => RoomPhase::Empty,
            1 if self.vacated => RoomPhase::Paused,
            1 => RoomPhase::Waiting,
            _ if self.active => RoomPhase::Active,
            _ => RoomPhase::Finished,
        }
    }
}
