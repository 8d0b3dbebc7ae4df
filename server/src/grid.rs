//! Static board model, movement validation and snapshot rendering
//!
//! The board only stores which cells are blocked. Occupancy is never stored
//! here; it is stamped onto a fresh copy every time a snapshot is rendered,
//! so a snapshot is always derived from the current participant set.

use rand::Rng;
use shared::{Cell, Direction, Grid, Position, Role};

/// Static status of a single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Open,
    Blocked,
}

/// Result of validating a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub accepted: bool,
}

/// Rectangular board of open and blocked tiles, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Board {
    /// Creates a board where every cell is open
    pub fn open(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "board must have at least one cell");
        Self {
            width,
            height,
            tiles: vec![Tile::Open; width * height],
        }
    }

    /// Generates a randomized board
    ///
    /// Each cell is blocked independently with probability `block_chance`.
    /// The four corners are forced open afterwards since they are the
    /// participants' starting cells.
    pub fn generate<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        block_chance: f64,
        rng: &mut R,
    ) -> Self {
        let mut board = Self::open(width, height);
        let chance = block_chance.clamp(0.0, 1.0);

        for tile in board.tiles.iter_mut() {
            if rng.gen_bool(chance) {
                *tile = Tile::Blocked;
            }
        }

        for corner in board.corners() {
            board.set_tile(corner, Tile::Open);
        }

        board
    }

    /// Builds an otherwise open board with the given cells blocked.
    /// Positions outside the board are ignored.
    pub fn with_blocked(width: usize, height: usize, blocked: &[Position]) -> Self {
        let mut board = Self::open(width, height);
        for &position in blocked {
            board.set_tile(position, Tile::Blocked);
        }
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Top-left, top-right, bottom-left, bottom-right
    pub fn corners(&self) -> [Position; 4] {
        let right = self.width - 1;
        let bottom = self.height - 1;
        [
            Position::new(0, 0),
            Position::new(right, 0),
            Position::new(0, bottom),
            Position::new(right, bottom),
        ]
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    pub fn tile(&self, position: Position) -> Option<Tile> {
        if self.contains(position) {
            Some(self.tiles[self.index(position)])
        } else {
            None
        }
    }

    /// Out-of-bounds cells count as blocked
    pub fn is_blocked(&self, position: Position) -> bool {
        self.tile(position) != Some(Tile::Open)
    }

    pub fn set_tile(&mut self, position: Position, tile: Tile) {
        if self.contains(position) {
            let index = self.index(position);
            self.tiles[index] = tile;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile == Tile::Blocked).count()
    }

    /// Validates one step from `from` in `direction`
    ///
    /// Steps past an edge are clamped, which leaves the position unchanged but
    /// still counts as accepted. A step onto a blocked tile is rejected and
    /// the unchanged position is returned. Other participants are ignored.
    pub fn apply_move(&self, from: Position, direction: Direction) -> MoveOutcome {
        let candidate = match direction {
            Direction::Up => Position::new(from.x, from.y.saturating_sub(1)),
            Direction::Down => Position::new(from.x, (from.y + 1).min(self.height - 1)),
            Direction::Left => Position::new(from.x.saturating_sub(1), from.y),
            Direction::Right => Position::new((from.x + 1).min(self.width - 1), from.y),
        };

        if self.is_blocked(candidate) {
            MoveOutcome {
                position: from,
                accepted: false,
            }
        } else {
            MoveOutcome {
                position: candidate,
                accepted: true,
            }
        }
    }

    /// Renders the static board with every occupant stamped on its cell.
    /// When two occupants share a cell, the later one in iteration order wins.
    pub fn render_snapshot<I>(&self, occupants: I) -> Grid
    where
        I: IntoIterator<Item = (Role, Position)>,
    {
        let mut grid: Grid = self
            .tiles
            .chunks(self.width)
            .map(|row| {
                row.iter()
                    .map(|tile| match tile {
                        Tile::Open => Cell::Open,
                        Tile::Blocked => Cell::Blocked,
                    })
                    .collect()
            })
            .collect();

        for (role, position) in occupants {
            if let Some(cell) = grid.get_mut(position.y).and_then(|row| row.get_mut(position.x)) {
                *cell = Cell::Occupied(role);
            }
        }

        grid
    }

    fn index(&self, position: Position) -> usize {
        position.y * self.width + position.x
    }
}

/// Returns true when the evader shares a cell with any pursuer.
/// Without an evader there is nothing to capture.
pub fn detect_capture<I>(occupants: I) -> bool
where
    I: IntoIterator<Item = (Role, Position)>,
{
    let occupants: Vec<(Role, Position)> = occupants.into_iter().collect();

    let Some(evader) = occupants
        .iter()
        .find(|(role, _)| role.is_evader())
        .map(|(_, position)| *position)
    else {
        return false;
    };

    occupants
        .iter()
        .any(|(role, position)| !role.is_evader() && *position == evader)
}
