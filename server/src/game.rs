//! Authoritative session state and command handling
//!
//! `GameState` is the single owner of the board and the participant registry.
//! Every transition takes an event (join, command, leave) and returns the
//! messages it produced; it never touches the transport, so the whole game
//! can be driven and inspected without sockets.

use crate::client_manager::{ClientManager, ConnectionId, JoinError, Participant};
use crate::grid::{detect_capture, Board};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Command, Direction, Grid, ServerMessage, BLOCK_CHANCE, GRID_HEIGHT, GRID_WIDTH};

/// Who an outbound message is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    One(ConnectionId),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn to(connection_id: ConnectionId, message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::One(connection_id),
            message,
        }
    }

    pub fn broadcast(message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::All,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    /// The evader was caught; movement is ignored until a restart
    Over,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub width: usize,
    pub height: usize,
    pub block_chance: f64,
    /// Fixed seed for reproducible boards; entropy when unset
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            block_chance: BLOCK_CHANCE,
            seed: None,
        }
    }
}

pub struct GameState {
    settings: GameSettings,
    board: Option<Board>,
    clients: ClientManager,
    phase: Phase,
    rng: StdRng,
}

impl GameState {
    pub fn new(settings: GameSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            clients: ClientManager::new(settings.width, settings.height),
            settings,
            board: None,
            phase: Phase::Playing,
            rng,
        }
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    /// Current board with participants stamped on, if a board exists
    pub fn snapshot(&self) -> Option<Grid> {
        self.board
            .as_ref()
            .map(|board| board.render_snapshot(self.clients.occupants()))
    }

    /// Registers a new connection as a participant
    ///
    /// The first joiner creates the board. Everyone gets the new grid, then
    /// the joiner gets its role. Joining a finished round also tells the
    /// joiner the game is over, so it waits for a restart.
    pub fn on_join(&mut self, connection_id: ConnectionId) -> Result<Vec<Outbound>, JoinError> {
        let participant = self.clients.add_client(connection_id)?;

        if self.board.is_none() {
            self.board = Some(self.generate_board());
            info!("Created a new board for the session");
        }

        let mut outbound = Vec::with_capacity(3);
        outbound.extend(self.grid_broadcast());
        outbound.push(Outbound::to(
            connection_id,
            ServerMessage::init(participant.role),
        ));
        if self.phase == Phase::Over {
            outbound.push(Outbound::to(connection_id, ServerMessage::game_over()));
        }
        Ok(outbound)
    }

    /// Dispatches a decoded command from a registered participant.
    /// Commands from unknown connections are dropped.
    pub fn handle_command(&mut self, connection_id: ConnectionId, command: Command) -> Vec<Outbound> {
        if self.clients.get(&connection_id).is_none() {
            debug!("Dropping command from unregistered connection {}", connection_id);
            return Vec::new();
        }

        match command {
            Command::Move(direction) => self.on_move(connection_id, direction),
            Command::Restart => self.on_restart(),
        }
    }

    /// Validates and commits one step, then checks for a capture
    pub fn on_move(&mut self, connection_id: ConnectionId, direction: Direction) -> Vec<Outbound> {
        if self.phase == Phase::Over {
            debug!("Ignoring move from {} after game over", connection_id);
            return Vec::new();
        }

        let Some(from) = self.clients.get(&connection_id).map(|p| p.position) else {
            return Vec::new();
        };
        let Some(outcome) = self.board.as_ref().map(|board| board.apply_move(from, direction))
        else {
            return Vec::new();
        };

        let mut outbound = Vec::with_capacity(2);

        if outcome.accepted {
            self.clients.set_position(&connection_id, outcome.position);

            if detect_capture(self.clients.occupants()) {
                info!("Evader captured at {}", outcome.position);
                self.phase = Phase::Over;
                outbound.push(Outbound::broadcast(ServerMessage::game_over()));
            }
        } else {
            debug!("Rejected {:?} from {} at {}", direction, connection_id, from);
        }

        outbound.extend(self.grid_broadcast());
        outbound
    }

    /// Resets every participant to its ordinal's start and rolls a new board
    pub fn on_restart(&mut self) -> Vec<Outbound> {
        if self.clients.is_empty() {
            return Vec::new();
        }

        self.clients.reset_all();
        self.board = Some(self.generate_board());
        self.phase = Phase::Playing;
        info!("Session restarted with {} participants", self.clients.len());

        let mut outbound: Vec<Outbound> = self
            .clients
            .participants()
            .map(|p| Outbound::to(p.connection_id, ServerMessage::init(p.role)))
            .collect();
        outbound.push(Outbound::broadcast(ServerMessage::restart()));
        outbound.extend(self.grid_broadcast());
        outbound
    }

    /// Removes a participant. The board is dropped once nobody is left.
    pub fn on_leave(&mut self, connection_id: ConnectionId) -> Vec<Outbound> {
        let Some(_removed) = self.clients.remove_client(&connection_id) else {
            return Vec::new();
        };

        if self.clients.is_empty() {
            self.board = None;
            self.phase = Phase::Playing;
            info!("Last participant left, discarding board");
            return Vec::new();
        }

        self.grid_broadcast().into_iter().collect()
    }

    pub fn participant(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.clients.get(connection_id)
    }

    fn generate_board(&mut self) -> Board {
        Board::generate(
            self.settings.width,
            self.settings.height,
            self.settings.block_chance,
            &mut self.rng,
        )
    }

    fn grid_broadcast(&self) -> Option<Outbound> {
        self.snapshot()
            .map(|grid| Outbound::broadcast(ServerMessage::grid(grid)))
    }
}
