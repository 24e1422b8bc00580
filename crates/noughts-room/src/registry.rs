//! Room registry: creates, finds, and deletes rooms, and tracks which
//! connection is in which room.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use noughts_protocol::{ConnectionId, RoomId, Symbol};
use rand::Rng;

use crate::room::spawn_room;
use crate::{ParticipantSender, RoomError, RoomHandle};

/// Length of a generated room id.
pub const ROOM_ID_LEN: usize = 5;

/// How many generated ids are tried before giving up.
pub const MAX_ID_ATTEMPTS: usize = 10;

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of candidate room ids.
///
/// Candidates may collide with live rooms; the registry retries.
pub trait IdGenerator: Send + 'static {
    fn generate(&mut self) -> String;
}

/// Random upper-case base-36 ids of [`ROOM_ID_LEN`] characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&mut self) -> String {
        let mut rng = rand::rng();
        (0..ROOM_ID_LEN)
            .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
            .collect()
    }
}

/// All live rooms plus the connection → room index.
///
/// Internally synchronized. The table lock covers map updates only and is
/// never held while a room actor is awaited.
pub struct RoomRegistry {
    tables: Mutex<Tables>,
}

struct Tables {
    rooms: HashMap<RoomId, RoomHandle>,

    /// A connection is a participant of at most one room. An entry is
    /// written before the room confirms the join and rolled back if the
    /// room refuses.
    members: HashMap<ConnectionId, RoomId>,

    ids: Box<dyn IdGenerator>,
}

impl Tables {
    fn fresh_id(&mut self) -> Result<RoomId, RoomError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.generate();
            match RoomId::parse(&candidate) {
                Ok(room_id) if !self.rooms.contains_key(&room_id) => return Ok(room_id),
                Ok(room_id) => tracing::debug!(%room_id, "generated room id collided"),
                Err(err) => tracing::warn!(%err, "generator produced an unusable id"),
            }
        }
        Err(RoomError::IdGenerationExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    fn is_vacant(&self, room_id: &RoomId) -> bool {
        !self.members.values().any(|rid| rid == room_id)
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_id_generator(RandomIds)
    }

    /// Uses `ids` instead of [`RandomIds`] for generated room ids.
    pub fn with_id_generator(ids: impl IdGenerator) -> Self {
        Self {
            tables: Mutex::new(Tables {
                rooms: HashMap::new(),
                members: HashMap::new(),
                ids: Box::new(ids),
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every update is a single insert or remove, so a poisoned table is
        // still consistent.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an empty room under `requested`, or under a generated id
    /// when `requested` is `None` or blank.
    pub fn create_room(&self, requested: Option<&str>) -> Result<RoomId, RoomError> {
        let mut tables = self.tables();
        let room_id = match requested.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let room_id = RoomId::parse(raw)?;
                if tables.rooms.contains_key(&room_id) {
                    return Err(RoomError::RoomIdTaken(room_id));
                }
                room_id
            }
            None => tables.fresh_id()?,
        };

        let handle = spawn_room(room_id.clone(), DEFAULT_CHANNEL_SIZE);
        tables.rooms.insert(room_id.clone(), handle);
        tracing::info!(%room_id, rooms = tables.rooms.len(), "room created");
        Ok(room_id)
    }

    /// Returns a handle to a live room.
    pub fn get_room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.tables()
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Removes a room and stops its actor. Deleting an absent room is a
    /// no-op.
    pub async fn delete_room(&self, room_id: &RoomId) {
        let Some(handle) = self.unlink(room_id, false) else {
            return;
        };
        let _ = handle.shutdown().await;
    }

    /// Adds `connection` to a room and returns its symbol.
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
        sender: ParticipantSender,
    ) -> Result<Symbol, RoomError> {
        let handle = self.reserve_seat(connection, room_id)?;

        match handle.join(connection, sender).await {
            Ok(symbol) => Ok(symbol),
            Err(err) => {
                self.release_seat(connection, room_id);
                if matches!(err, RoomError::Unavailable(_)) {
                    self.delete_room(room_id).await;
                }
                Err(err)
            }
        }
    }

    /// Removes `connection` from whatever room it is in, deleting that room
    /// if it is left empty. Returns the room it left, if any.
    pub async fn leave(&self, connection: ConnectionId) -> Result<Option<RoomId>, RoomError> {
        let Some((room_id, handle)) = self.take_membership(connection) else {
            return Ok(None);
        };
        let Some(handle) = handle else {
            return Ok(Some(room_id));
        };

        let doomed = match handle.leave(connection).await {
            // Someone may have reserved a seat since the actor answered.
            Ok(0) => self.unlink(&room_id, true),
            Err(RoomError::Unavailable(_)) => self.unlink(&room_id, false),
            Ok(_) => None,
            Err(err) => return Err(err),
        };
        if let Some(handle) = doomed {
            let _ = handle.shutdown().await;
        }
        Ok(Some(room_id))
    }

    /// Returns the room `connection` is currently in, if any.
    pub fn room_of(&self, connection: ConnectionId) -> Option<RoomId> {
        self.tables().members.get(&connection).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.tables().rooms.len()
    }

    fn reserve_seat(
        &self,
        connection: ConnectionId,
        room_id: &RoomId,
    ) -> Result<RoomHandle, RoomError> {
        let mut tables = self.tables();
        if let Some(current) = tables.members.get(&connection) {
            return Err(RoomError::AlreadyInRoom(connection, current.clone()));
        }
        let handle = tables
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        tables.members.insert(connection, room_id.clone());
        Ok(handle)
    }

    fn release_seat(&self, connection: ConnectionId, room_id: &RoomId) {
        let mut tables = self.tables();
        if tables.members.get(&connection) == Some(room_id) {
            tables.members.remove(&connection);
        }
    }

    fn take_membership(&self, connection: ConnectionId) -> Option<(RoomId, Option<RoomHandle>)> {
        let mut tables = self.tables();
        let room_id = tables.members.remove(&connection)?;
        let handle = tables.rooms.get(&room_id).cloned();
        Some((room_id, handle))
    }

    /// Drops a room from the table and returns its handle for shutdown.
    /// With `only_if_vacant`, a room that still has members is kept.
    fn unlink(&self, room_id: &RoomId, only_if_vacant: bool) -> Option<RoomHandle> {
        let mut tables = self.tables();
        if only_if_vacant && !tables.is_vacant(room_id) {
            tracing::debug!(%room_id, "room refilled before deletion");
            return None;
        }
        let handle = tables.rooms.remove(room_id)?;
        tables.members.retain(|_, rid| rid != room_id);
        tracing::info!(%room_id, rooms = tables.rooms.len(), "room deleted");
        Some(handle)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::room::{RoomCommand, detached_room};

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn dummy_sender() -> ParticipantSender {
        mpsc::unbounded_channel().0
    }

    /// Registry holding a room "STALL" whose commands the test answers by
    /// hand.
    fn with_stalled_room() -> (Arc<RoomRegistry>, RoomId, mpsc::Receiver<RoomCommand>) {
        let registry = Arc::new(RoomRegistry::new());
        let stalled = RoomId::parse("STALL").unwrap();
        let (handle, commands) = detached_room(stalled.clone());
        registry.tables().rooms.insert(stalled.clone(), handle);
        (registry, stalled, commands)
    }

    /// Joins, leaves and creates on other rooms, failing if any of it waits
    /// on the stalled room.
    async fn other_rooms_progress(registry: &RoomRegistry) {
        let outcome = tokio::time::timeout(Duration::from_secs(1), async {
            let other = registry.create_room(Some("OTHER")).unwrap();
            registry.join_room(conn(9), &other, dummy_sender()).await.unwrap();
            registry.get_room(&other).unwrap().make_move(conn(9), 0).await.unwrap_err();
            registry.leave(conn(9)).await.unwrap();
        })
        .await;
        assert!(outcome.is_ok(), "other rooms waited on a stalled room");
    }

    #[tokio::test]
    async fn test_pending_join_does_not_block_other_rooms() {
        let (registry, stalled, mut commands) = with_stalled_room();
        let pending = tokio::spawn({
            let registry = Arc::clone(&registry);
            let stalled = stalled.clone();
            async move { registry.join_room(conn(1), &stalled, dummy_sender()).await }
        });
        let Some(RoomCommand::Join { reply, .. }) = commands.recv().await else {
            panic!("expected the join to reach the room");
        };

        other_rooms_progress(&registry).await;
        assert_eq!(registry.room_of(conn(1)), Some(stalled.clone()));

        // The room goes away without answering.
        drop(reply);
        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, RoomError::Unavailable(_)));
        assert_eq!(registry.room_of(conn(1)), None);
        assert!(registry.get_room(&stalled).is_err());
    }

    #[tokio::test]
    async fn test_pending_leave_does_not_block_other_rooms() {
        let (registry, stalled, mut commands) = with_stalled_room();
        registry.tables().members.insert(conn(1), stalled.clone());
        let pending = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.leave(conn(1)).await }
        });
        let Some(RoomCommand::Leave { reply, .. }) = commands.recv().await else {
            panic!("expected the leave to reach the room");
        };

        other_rooms_progress(&registry).await;
        assert_eq!(registry.room_of(conn(1)), None);

        reply.send(Ok(0)).unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), Some(stalled.clone()));
        assert!(registry.get_room(&stalled).is_err());
        assert!(matches!(commands.recv().await, Some(RoomCommand::Shutdown)));
    }

    #[tokio::test]
    async fn test_emptied_room_survives_a_seat_reserved_meanwhile() {
        let (registry, stalled, mut commands) = with_stalled_room();
        registry.tables().members.insert(conn(1), stalled.clone());
        let pending = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.leave(conn(1)).await }
        });
        let Some(RoomCommand::Leave { reply, .. }) = commands.recv().await else {
            panic!("expected the leave to reach the room");
        };

        registry.reserve_seat(conn(2), &stalled).unwrap();
        reply.send(Ok(0)).unwrap();
        pending.await.unwrap().unwrap();

        assert!(registry.get_room(&stalled).is_ok());
        assert_eq!(registry.room_of(conn(2)), Some(stalled));
    }

    #[test]
    fn test_random_ids_shape() {
        let mut ids = RandomIds;
        for _ in 0..100 {
            let id = ids.generate();
            assert_eq!(id.len(), ROOM_ID_LEN);
            assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)), "{id}");
            assert!(RoomId::parse(&id).is_ok());
        }
    }
}
