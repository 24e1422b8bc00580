//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Every action on a room goes through its command channel, so actions on
//! the same room are applied one at a time in arrival order while separate
//! rooms progress independently.

use std::collections::HashMap;

use noughts_protocol::{ConnectionId, GameSnapshot, Recipient, RoomId, ServerEvent, Symbol};
use tokio::sync::{mpsc, oneshot};

use crate::engine::{self, Notice};
use crate::{Room, RoomError, RoomPhase};

/// Channel sender for delivering events to one participant's connection.
pub type ParticipantSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Every variant but `Shutdown` carries a reply channel; the caller waits
/// on it so it can report a refusal to the requester only.
pub(crate) enum RoomCommand {
    Join {
        connection: ConnectionId,
        sender: ParticipantSender,
        reply: oneshot::Sender<Result<Symbol, RoomError>>,
    },

    Move {
        connection: ConnectionId,
        index: i64,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Reset {
        reply: oneshot::Sender<()>,
    },

    /// Replies with the number of participants left.
    Leave {
        connection: ConnectionId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    Snapshot {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A point-in-time view of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: RoomPhase,
    /// Connection and symbol of each participant, in join order.
    pub participants: Vec<(ConnectionId, Symbol)>,
    pub state: GameSnapshot,
}

/// Handle to a running room actor.
///
/// Cheap to clone. The registry holds one per room and hands out clones
/// so callers can await the actor without holding the registry.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Adds a participant and returns the symbol it was assigned.
    pub async fn join(
        &self,
        connection: ConnectionId,
        sender: ParticipantSender,
    ) -> Result<Symbol, RoomError> {
        self.request(|reply| RoomCommand::Join {
            connection,
            sender,
            reply,
        })
        .await?
    }

    /// Plays `index` for `connection`.
    pub async fn make_move(&self, connection: ConnectionId, index: i64) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Move {
            connection,
            index,
            reply,
        })
        .await?
    }

    /// Starts a fresh game on the same room.
    pub async fn reset(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Reset { reply }).await
    }

    /// Removes a participant and returns how many remain.
    pub async fn leave(&self, connection: ConnectionId) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Leave { connection, reply })
            .await?
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Tells the room to stop. Pending commands queued before this one
    /// are still processed.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    senders: HashMap<ConnectionId, ParticipantSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room.id(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    connection,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(connection, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Move {
                    connection,
                    index,
                    reply,
                } => {
                    let result = engine::make_move(&mut self.room, connection, index)
                        .map(|notices| self.dispatch(notices));
                    if let Err(err) = &result {
                        tracing::debug!(
                            room_id = %self.room.id(),
                            %connection,
                            index,
                            %err,
                            "move refused"
                        );
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::Reset { reply } => {
                    let notices = engine::reset(&mut self.room);
                    self.dispatch(notices);
                    let _ = reply.send(());
                }
                RoomCommand::Leave { connection, reply } => {
                    let result = self.handle_leave(connection);
                    let _ = reply.send(result);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room.id(), "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room.id(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        connection: ConnectionId,
        sender: ParticipantSender,
    ) -> Result<Symbol, RoomError> {
        let (symbol, notices) = engine::join(&mut self.room, connection)?;
        self.senders.insert(connection, sender);
        tracing::info!(
            room_id = %self.room.id(),
            %connection,
            %symbol,
            participants = self.room.participants().len(),
            phase = %self.room.phase(),
            "participant joined"
        );
        self.dispatch(notices);
        Ok(symbol)
    }

    fn handle_leave(&mut self, connection: ConnectionId) -> Result<usize, RoomError> {
        let notices = engine::leave(&mut self.room, connection)?;
        self.senders.remove(&connection);
        let remaining = self.room.participants().len();
        tracing::info!(
            room_id = %self.room.id(),
            %connection,
            participants = remaining,
            phase = %self.room.phase(),
            "participant left"
        );
        self.dispatch(notices);
        Ok(remaining)
    }

    /// Fans notices out to the current participants.
    fn dispatch(&self, notices: Vec<Notice>) {
        for (recipient, event) in notices {
            match recipient {
                Recipient::Room => {
                    for participant in self.room.participants() {
                        self.send_to(participant.connection, event.clone());
                    }
                }
                Recipient::Connection(connection) => self.send_to(connection, event),
            }
        }
    }

    /// Drops the event if the participant's connection is already gone.
    fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&connection) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room.id().clone(),
            phase: self.room.phase(),
            participants: self
                .room
                .participants()
                .iter()
                .map(|p| (p.connection, p.symbol))
                .collect(),
            state: self.room.snapshot(),
        }
    }
}

/// Spawns a room actor for a fresh, empty room.
///
/// `channel_size` bounds the command queue; senders wait when it fills.
pub(crate) fn spawn_room(room_id: RoomId, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(room_id.clone()),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}

/// A handle with no actor behind it. The caller owns the command queue and
/// decides when, or whether, each command is answered.
#[cfg(test)]
pub(crate) fn detached_room(room_id: RoomId) -> (RoomHandle, mpsc::Receiver<RoomCommand>) {
    let (tx, rx) = mpsc::channel(8);
    (RoomHandle { room_id, sender: tx }, rx)
}
