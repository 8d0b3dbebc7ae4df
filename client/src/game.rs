//! Client-side view of the session, built purely from server messages

use shared::{Grid, Role, ServerEvent, ServerMessage};

/// What the client currently knows about the shared session
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    pub role: Option<Role>,
    pub grid: Option<Grid>,
    pub game_over: bool,
    /// Set when the server turned this connection away
    pub rejected: Option<String>,
}

/// What changed after applying a server message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Role,
    Grid,
    GameOver,
    Restarted,
    Rejected,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input is only forwarded while a round is running
    pub fn accepts_input(&self) -> bool {
        self.role.is_some() && !self.game_over && self.rejected.is_none()
    }

    pub fn apply(&mut self, message: ServerMessage) -> Update {
        match message {
            ServerMessage::Grid { grid } => {
                self.grid = Some(grid);
                Update::Grid
            }
            ServerMessage::Event(ServerEvent::Init { color }) => {
                self.role = Some(color);
                Update::Role
            }
            ServerMessage::Event(ServerEvent::GameOver) => {
                self.game_over = true;
                Update::GameOver
            }
            ServerMessage::Event(ServerEvent::Restart) => {
                self.game_over = false;
                Update::Restarted
            }
            ServerMessage::Event(ServerEvent::Rejected { reason }) => {
                self.rejected = Some(reason);
                Update::Rejected
            }
        }
    }
}
