//! Session registry for participants on the shared board
//!
//! This module tracks which connection controls which participant:
//! - Ordinal (join slot) assignment and the fixed role table
//! - Starting corners for each role
//! - Capacity enforcement (four participants per board)
//! - Position bookkeeping for committed moves and restarts
//!
//! Participants are kept in join order, which is the order snapshots stamp
//! them in. With at most four entries a plain vector is all the index needed.

use log::info;
use shared::{Position, Role, MAX_PARTICIPANTS};
use thiserror::Error;

/// Identity of a single transport connection
pub type ConnectionId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("session is full ({0} participants)")]
    Full(usize),
    #[error("connection {0} has already joined")]
    AlreadyJoined(ConnectionId),
}

/// Starting cell for a role on a `width` x `height` board
///
/// Every role starts in its own corner: red top-left, green bottom-right,
/// blue top-right, yellow bottom-left.
pub fn start_position(role: Role, width: usize, height: usize) -> Position {
    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);
    match role {
        Role::Red => Position::new(0, 0),
        Role::Green => Position::new(right, bottom),
        Role::Blue => Position::new(right, 0),
        Role::Yellow => Position::new(0, bottom),
    }
}

/// A connected participant and their place on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Connection that controls this participant
    pub connection_id: ConnectionId,
    /// Join slot in `1..=4`; decides role and start corner
    pub ordinal: u8,
    pub role: Role,
    pub position: Position,
}

impl Participant {
    /// Creates a participant at its ordinal's starting corner.
    /// Returns None for ordinals outside the role table.
    pub fn new(connection_id: ConnectionId, ordinal: u8, width: usize, height: usize) -> Option<Self> {
        let role = Role::from_ordinal(ordinal)?;
        Some(Self {
            connection_id,
            ordinal,
            role,
            position: start_position(role, width, height),
        })
    }

    /// Moves the participant back to its role's starting corner.
    /// The role itself is fixed for the lifetime of the participant.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.position = start_position(self.role, width, height);
    }
}

/// Tracks all participants sharing the board
pub struct ClientManager {
    clients: Vec<Participant>,
    max_clients: usize,
    width: usize,
    height: usize,
}

impl ClientManager {
    /// Creates an empty registry for a board of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            clients: Vec::new(),
            max_clients: MAX_PARTICIPANTS,
            width,
            height,
        }
    }

    /// Registers a new participant for `connection_id`
    ///
    /// The participant takes the lowest free ordinal, so a slot vacated by a
    /// disconnect is handed to the next joiner instead of duplicating a role
    /// that is still on the board.
    pub fn add_client(&mut self, connection_id: ConnectionId) -> Result<Participant, JoinError> {
        if self.get(&connection_id).is_some() {
            return Err(JoinError::AlreadyJoined(connection_id));
        }
        if self.is_full() {
            return Err(JoinError::Full(self.max_clients));
        }

        let ordinal = self
            .free_ordinal()
            .ok_or(JoinError::Full(self.max_clients))?;
        let participant = Participant::new(connection_id, ordinal, self.width, self.height)
            .ok_or(JoinError::Full(self.max_clients))?;

        info!(
            "Connection {} joined as #{} ({}) at {}",
            connection_id, ordinal, participant.role, participant.position
        );
        self.clients.push(participant.clone());

        Ok(participant)
    }

    /// Removes a participant, returning it if it was registered
    pub fn remove_client(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let index = self
            .clients
            .iter()
            .position(|p| p.connection_id == *connection_id)?;
        let removed = self.clients.remove(index);
        info!(
            "Connection {} left, freeing #{} ({})",
            connection_id, removed.ordinal, removed.role
        );
        Some(removed)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.clients.iter().find(|p| p.connection_id == *connection_id)
    }

    /// Commits a validated position. Returns false for unknown connections.
    pub fn set_position(&mut self, connection_id: &ConnectionId, position: Position) -> bool {
        if let Some(participant) = self
            .clients
            .iter_mut()
            .find(|p| p.connection_id == *connection_id)
        {
            participant.position = position;
            true
        } else {
            false
        }
    }

    /// Puts every participant back on its ordinal's starting corner
    pub fn reset_all(&mut self) {
        for participant in self.clients.iter_mut() {
            participant.reset(self.width, self.height);
        }
    }

    /// Participants in join order
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.clients.iter()
    }

    /// (role, position) pairs in join order, as consumed by the grid engine
    pub fn occupants(&self) -> impl Iterator<Item = (Role, Position)> + '_ {
        self.clients.iter().map(|p| (p.role, p.position))
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.clients.iter().map(|p| p.connection_id).collect()
    }

    /// Returns the number of registered participants
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    fn free_ordinal(&self) -> Option<u8> {
        (1..=self.max_clients as u8)
            .find(|ordinal| !self.clients.iter().any(|p| p.ordinal == *ordinal))
    }
}
