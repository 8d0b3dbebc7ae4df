use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const GRID_WIDTH: usize = 40;
pub const GRID_HEIGHT: usize = 20;
pub const BLOCK_CHANCE: f64 = 0.2;
pub const MAX_PARTICIPANTS: usize = 4;

pub const KEY_UP: &str = "ArrowUp";
pub const KEY_DOWN: &str = "ArrowDown";
pub const KEY_LEFT: &str = "ArrowLeft";
pub const KEY_RIGHT: &str = "ArrowRight";
pub const KEY_RESTART: &str = "restart";

/// Row-major rendering of the board, indexed `grid[y][x]`.
pub type Grid = Vec<Vec<Cell>>;

/// Fixed role table. The ordinal (join slot) decides the role: slot 1 is the
/// evader, every other slot is a pursuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Role {
    pub const ALL: [Role; MAX_PARTICIPANTS] = [Role::Red, Role::Green, Role::Blue, Role::Yellow];

    pub fn from_ordinal(ordinal: u8) -> Option<Role> {
        match ordinal {
            1..=4 => Some(Self::ALL[ordinal as usize - 1]),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Role::Red => 1,
            Role::Green => 2,
            Role::Blue => 3,
            Role::Yellow => 4,
        }
    }

    pub fn is_evader(self) -> bool {
        self == Role::Red
    }

    pub fn color(self) -> &'static str {
        match self {
            Role::Red => "red",
            Role::Green => "green",
            Role::Blue => "blue",
            Role::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.color())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            KEY_UP => Some(Direction::Up),
            KEY_DOWN => Some(Direction::Down),
            KEY_LEFT => Some(Direction::Left),
            KEY_RIGHT => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Direction::Up => KEY_UP,
            Direction::Down => KEY_DOWN,
            Direction::Left => KEY_LEFT,
            Direction::Right => KEY_RIGHT,
        }
    }
}

/// One cell of a rendered grid. On the wire this is a bare string:
/// `"open"`, `"blocked"` or the occupant's colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Open,
    Blocked,
    Occupied(Role),
}

impl Cell {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cell::Open => "open",
            Cell::Blocked => "blocked",
            Cell::Occupied(role) => role.color(),
        }
    }
}

impl FromStr for Cell {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Cell::Open),
            "blocked" => Ok(Cell::Blocked),
            "red" => Ok(Cell::Occupied(Role::Red)),
            "green" => Ok(Cell::Occupied(Role::Green)),
            "blue" => Ok(Cell::Occupied(Role::Blue)),
            "yellow" => Ok(Cell::Occupied(Role::Yellow)),
            other => Err(ProtocolError::UnknownCell(other.to_string())),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
    #[error("unknown cell state `{0}`")]
    UnknownCell(String),
}

/// Raw inbound message, `{ "key": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub key: String,
}

/// A decoded inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Restart,
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        Self::from_key(&message.key)
    }

    pub fn from_key(key: &str) -> Result<Self, ProtocolError> {
        if key == KEY_RESTART {
            return Ok(Command::Restart);
        }
        Direction::from_key(key)
            .map(Command::Move)
            .ok_or_else(|| ProtocolError::UnknownKey(key.to_string()))
    }

    pub fn key(self) -> &'static str {
        match self {
            Command::Move(direction) => direction.key(),
            Command::Restart => KEY_RESTART,
        }
    }

    pub fn to_json(self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&ClientMessage {
            key: self.key().to_string(),
        })
    }
}

/// Events discriminated by a `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    Init { color: Role },
    GameOver,
    Restart,
    Rejected { reason: String },
}

/// Everything the server sends. Grid snapshots carry no `type` field, so the
/// two shapes are told apart structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(ServerEvent),
    Grid { grid: Grid },
}

impl ServerMessage {
    pub fn init(role: Role) -> Self {
        ServerMessage::Event(ServerEvent::Init { color: role })
    }

    pub fn game_over() -> Self {
        ServerMessage::Event(ServerEvent::GameOver)
    }

    pub fn restart() -> Self {
        ServerMessage::Event(ServerEvent::Restart)
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        ServerMessage::Event(ServerEvent::Rejected {
            reason: reason.into(),
        })
    }

    pub fn grid(grid: Grid) -> Self {
        ServerMessage::Grid { grid }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
