//! The match engine: validates an action against a room and applies it.
//!
//! Every function here is synchronous and deterministic. It mutates the
//! room in place and returns the notices to fan out; it never talks to a
//! connection itself. A refused action returns `Err` and leaves the room
//! exactly as it was; the caller reports the error to the requester only.

use noughts_protocol::{ConnectionId, MoveRejection, Recipient, ServerEvent, Symbol};

use crate::{Board, Participant, Room, RoomError};

/// One outbound event and who gets it.
pub type Notice = (Recipient, ServerEvent);

/// Text sent to the remaining participant when the other one leaves.
pub const OPPONENT_LEFT_TEXT: &str = "Your opponent has disconnected. Waiting for a new player...";

/// Text broadcast after a reset.
pub const RESET_TEXT: &str = "Game has been reset!";

/// Adds `connection` to the room and returns its symbol.
///
/// The newcomer gets whichever symbol is free. When this fills the room a
/// fresh game starts with X to move, and everyone gets the full state;
/// otherwise only the newcomer hears back.
pub fn join(
    room: &mut Room,
    connection: ConnectionId,
) -> Result<(Symbol, Vec<Notice>), RoomError> {
    if room.participant(connection).is_some() {
        return Err(RoomError::AlreadyInRoom(connection, room.id.clone()));
    }
    let symbol = match room.free_symbol() {
        Some(symbol) if !room.is_full() => symbol,
        _ => return Err(RoomError::RoomFull(room.id.clone())),
    };

    room.participants.push(Participant { connection, symbol });

    let mut notices = Vec::with_capacity(3);
    if room.is_full() {
        room.board.clear();
        room.turn = Symbol::X;
        room.active = true;
        room.vacated = false;
        tracing::info!(room_id = %room.id, "game starting");

        notices.push(joined(room, connection, symbol));
        notices.push((
            Recipient::Room,
            ServerEvent::Message {
                text: format!("{connection} joined the room. Game starting!"),
            },
        ));
        notices.push((
            Recipient::Room,
            ServerEvent::GameStateUpdate {
                state: room.snapshot(),
            },
        ));
    } else {
        room.active = false;
        notices.push(joined(room, connection, symbol));
    }

    Ok((symbol, notices))
}

/// Places the mover's symbol at `index`, then checks win before draw.
pub fn make_move(
    room: &mut Room,
    connection: ConnectionId,
    index: i64,
) -> Result<Vec<Notice>, RoomError> {
    if !room.active || !room.is_full() {
        return Err(RoomError::InvalidMove(MoveRejection::NotActive));
    }
    let symbol = room
        .participant(connection)
        .map(|p| p.symbol)
        .ok_or(RoomError::InvalidMove(MoveRejection::NotInRoom))?;
    if symbol != room.turn {
        return Err(RoomError::InvalidMove(MoveRejection::NotYourTurn));
    }
    let cell =
        Board::cell_index(index).ok_or(RoomError::InvalidMove(MoveRejection::CellTaken))?;
    room.board
        .place(cell, symbol)
        .map_err(RoomError::InvalidMove)?;

    if let Some(cells) = room.board.winning_triple(symbol) {
        room.active = false;
        tracing::info!(room_id = %room.id, winner = %symbol, ?cells, "game won");
        return Ok(vec![(
            Recipient::Room,
            ServerEvent::Win {
                winner: symbol,
                cells,
                state: room.snapshot(),
            },
        )]);
    }

    if room.board.is_full() {
        room.active = false;
        tracing::info!(room_id = %room.id, "game drawn");
        return Ok(vec![(
            Recipient::Room,
            ServerEvent::Draw {
                state: room.snapshot(),
            },
        )]);
    }

    room.turn = symbol.other();
    Ok(vec![(
        Recipient::Room,
        ServerEvent::GameStateUpdate {
            state: room.snapshot(),
        },
    )])
}

/// Clears the board and makes play active with X to move.
///
/// Allowed from any phase, including a room with a single participant. A
/// paused room stops being paused and waits for its next opponent.
pub fn reset(room: &mut Room) -> Vec<Notice> {
    room.board.clear();
    room.turn = Symbol::X;
    room.active = true;
    room.vacated = false;
    tracing::info!(room_id = %room.id, "game reset");

    vec![
        (
            Recipient::Room,
            ServerEvent::GameStateUpdate {
                state: room.snapshot(),
            },
        ),
        (
            Recipient::Room,
            ServerEvent::Message {
                text: RESET_TEXT.to_string(),
            },
        ),
    ]
}

/// Removes `connection` from the room.
///
/// If someone remains, play pauses and they are told. If nobody remains
/// there is nothing to send; the caller deletes the room.
pub fn leave(room: &mut Room, connection: ConnectionId) -> Result<Vec<Notice>, RoomError> {
    let position = room
        .participants
        .iter()
        .position(|p| p.connection == connection)
        .ok_or_else(|| RoomError::NotInRoom(connection, room.id.clone()))?;
    room.participants.remove(position);

    if room.is_empty() {
        room.active = false;
        return Ok(Vec::new());
    }

    room.active = false;
    room.vacated = true;
    Ok(vec![(
        Recipient::Room,
        ServerEvent::PlayerDisconnected {
            message: OPPONENT_LEFT_TEXT.to_string(),
        },
    )])
}

fn joined(room: &Room, connection: ConnectionId, symbol: Symbol) -> Notice {
    (
        Recipient::Connection(connection),
        ServerEvent::RoomJoined {
            room_id: room.id.clone(),
            symbol,
            state: room.snapshot(),
        },
    )
}
