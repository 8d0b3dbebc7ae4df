//! ASCII rendering of received grids

use crate::game::ClientGameState;
use shared::{Cell, Grid, Role};

fn glyph(cell: &Cell) -> char {
    match cell {
        Cell::Open => '.',
        Cell::Blocked => '#',
        Cell::Occupied(Role::Red) => 'R',
        Cell::Occupied(Role::Green) => 'G',
        Cell::Occupied(Role::Blue) => 'B',
        Cell::Occupied(Role::Yellow) => 'Y',
    }
}

/// One text line per grid row
pub fn render_grid(grid: &Grid) -> String {
    grid.iter()
        .map(|row| row.iter().map(glyph).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status text shown above the grid
pub fn status_line(state: &ClientGameState) -> String {
    if let Some(reason) = &state.rejected {
        return format!("Rejected: {}", reason);
    }
    if state.game_over {
        return "Game Over! Type r to restart.".to_string();
    }
    match state.role {
        Some(role) if role.is_evader() => format!("You are {}. Run away from the others!", role),
        Some(role) => format!("You are {}. Catch red!", role),
        None => "Waiting for role assignment...".to_string(),
    }
}

/// Full screen: status followed by the grid, if any
pub fn render_screen(state: &ClientGameState) -> String {
    let mut screen = status_line(state);
    if let Some(grid) = &state.grid {
        screen.push('\n');
        screen.push_str(&render_grid(grid));
    }
    screen
}
