//! Per-connection handler: action decoding, dispatch, and outbound framing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that frames every outbound event as an
//!      [`Envelope`] (replies and room fan-out share one channel, so `seq`
//!      is strictly increasing on the wire)
//!   2. Loop: receive frames → decode [`ClientAction`] → dispatch
//!   3. On close, error, or idle timeout: the drop guard leaves the room

use std::sync::Arc;
use std::time::Instant;

use noughts_protocol::{ClientAction, Codec, ConnectionId, Envelope, RoomId, ServerEvent};
use noughts_room::{ParticipantSender, RoomError, RoomHandle};
use noughts_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::NoughtsError;
use crate::server::ServerState;

/// Drop guard that removes the connection from its room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async leave runs in a spawned task.
struct ConnectionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.rooms.leave(conn_id).await {
                Ok(Some(room_id)) => {
                    tracing::info!(%conn_id, %room_id, "left room on disconnect")
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(%conn_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), NoughtsError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let start = Instant::now();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        Arc::clone(&state),
        outbound_rx,
        start,
    ));
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection timed out");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let action: ClientAction = match state.codec.decode(&data) {
            Ok(action) => action,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode action");
                reply(
                    &outbound,
                    ServerEvent::Error {
                        code: 400,
                        message: format!("invalid message: {e}"),
                    },
                );
                continue;
            }
        };

        if let Err(e) = dispatch(action, conn_id, &state, &outbound, &start).await {
            tracing::debug!(%conn_id, error = %e, "action refused");
            reply(&outbound, e.to_event());
        }
    }

    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → leave fires.
    Ok(())
}

/// Applies one client action. Successful outcomes are delivered by the
/// room actor or pushed onto `outbound` here; a refusal comes back as
/// `Err` for the caller to report.
async fn dispatch<C: Codec>(
    action: ClientAction,
    conn_id: ConnectionId,
    state: &ServerState<C>,
    outbound: &ParticipantSender,
    start: &Instant,
) -> Result<(), RoomError> {
    match action {
        ClientAction::CreateRoom { room_id } => {
            let rooms = &state.rooms;
            if let Some(current) = rooms.room_of(conn_id) {
                return Err(RoomError::AlreadyInRoom(conn_id, current));
            }
            let room_id = rooms.create_room(room_id.as_deref())?;
            reply(
                outbound,
                ServerEvent::RoomCreated {
                    room_id: room_id.clone(),
                },
            );
            // The creator takes the first seat.
            if let Err(e) = rooms.join_room(conn_id, &room_id, outbound.clone()).await {
                rooms.delete_room(&room_id).await;
                return Err(e);
            }
            tracing::info!(%conn_id, %room_id, "room created and joined");
        }

        ClientAction::JoinRoom { room_id } => {
            let room_id = RoomId::parse(&room_id)?;
            let symbol = state
                .rooms
                .join_room(conn_id, &room_id, outbound.clone())
                .await?;
            tracing::info!(%conn_id, %room_id, %symbol, "joined room");
        }

        ClientAction::MakeMove { room_id, index } => {
            let handle = room_handle(state, &room_id)?;
            handle.make_move(conn_id, index).await?;
        }

        ClientAction::ResetGame { room_id } => {
            let handle = room_handle(state, &room_id)?;
            handle.reset().await?;
        }

        ClientAction::LeaveRoom => {
            let left = state.rooms.leave(conn_id).await?;
            match left {
                Some(room_id) => tracing::info!(%conn_id, %room_id, "left room"),
                None => tracing::debug!(%conn_id, "leave while not in a room"),
            }
        }

        ClientAction::Heartbeat { client_time } => {
            reply(
                outbound,
                ServerEvent::HeartbeatAck {
                    client_time,
                    server_time: elapsed_millis(start),
                },
            );
        }
    }

    Ok(())
}

fn room_handle<C: Codec>(state: &ServerState<C>, raw_id: &str) -> Result<RoomHandle, RoomError> {
    let room_id = RoomId::parse(raw_id)?;
    state.rooms.get_room(&room_id)
}

/// Queues an event for this connection only.
fn reply(outbound: &ParticipantSender, event: ServerEvent) {
    // Only fails once the writer is gone, i.e. the connection is closing.
    let _ = outbound.send(event);
}

/// Drains outbound events into framed envelopes until the channel or the
/// connection closes.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    start: Instant,
) {
    let conn_id = conn.id();
    let mut seq: u64 = 1;

    while let Some(event) = events.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: elapsed_millis(&start),
            event,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode envelope");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

fn elapsed_millis(start: &Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
