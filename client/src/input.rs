//! Terminal input parsing
//!
//! Lines typed on stdin are mapped to protocol commands. WASD, arrow names
//! and the raw protocol keys are all accepted.

use shared::{Command, Direction};
use tokio::io::{AsyncBufRead, Lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Send(Command),
    Quit,
}

/// Maps one line of user input to an action. Unknown input yields None.
pub fn parse_line(line: &str) -> Option<InputAction> {
    let action = match line.trim().to_ascii_lowercase().as_str() {
        "w" | "up" | "arrowup" => InputAction::Send(Command::Move(Direction::Up)),
        "s" | "down" | "arrowdown" => InputAction::Send(Command::Move(Direction::Down)),
        "a" | "left" | "arrowleft" => InputAction::Send(Command::Move(Direction::Left)),
        "d" | "right" | "arrowright" => InputAction::Send(Command::Move(Direction::Right)),
        "r" | "restart" => InputAction::Send(Command::Restart),
        "q" | "quit" | "exit" => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

/// Reads lines until one parses. End of input counts as quitting.
pub async fn next_action<R>(lines: &mut Lines<R>) -> std::io::Result<InputAction>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if let Some(action) = parse_line(&line) {
            return Ok(action);
        }
        if !line.trim().is_empty() {
            println!("Unknown input '{}'. Use w/a/s/d, r to restart, q to quit.", line.trim());
        }
    }
    Ok(InputAction::Quit)
}
