//! Integration tests for the grid chase server
//!
//! These tests start a real server on an ephemeral port and talk to it over
//! WebSockets exactly like a browser client would.

use client::network::Client;
use futures_util::{SinkExt, StreamExt};
use server::game::GameSettings;
use server::network::Server;
use shared::{Cell, Grid, Role, ServerEvent, ServerMessage, GRID_HEIGHT, GRID_WIDTH};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

async fn start_server(settings: GameSettings) -> SocketAddr {
    let mut server = Server::new("127.0.0.1:0", settings)
        .await
        .expect("Failed to bind server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

fn open_board() -> GameSettings {
    GameSettings {
        block_chance: 0.0,
        seed: Some(1),
        ..GameSettings::default()
    }
}

fn random_board(seed: u64) -> GameSettings {
    GameSettings {
        seed: Some(seed),
        ..GameSettings::default()
    }
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}", addr))
        .await
        .expect("Failed to connect");
    ws
}

async fn next_text(ws: &mut Ws) -> String {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for server message")
            .expect("Connection ended")
            .expect("Failed to read frame");

        if let Message::Text(text) = frame {
            return text.as_str().to_owned();
        }
    }
}

async fn next_message(ws: &mut Ws) -> ServerMessage {
    let text = next_text(ws).await;
    ServerMessage::parse(&text).expect("Unreadable server message")
}

async fn next_grid(ws: &mut Ws) -> Grid {
    match next_message(ws).await {
        ServerMessage::Grid { grid } => grid,
        other => panic!("Expected grid, got {:?}", other),
    }
}

/// Skips grids until the next typed event
async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        if let ServerMessage::Event(event) = next_message(ws).await {
            return event;
        }
    }
}

async fn send_key(ws: &mut Ws, key: &str) {
    let text = format!(r#"{{"key":"{}"}}"#, key);
    ws.send(Message::text(text)).await.expect("Failed to send");
}

/// Connects and consumes the join grid plus the role assignment
async fn join(addr: SocketAddr, expected: Role) -> (Ws, Grid) {
    let mut ws = connect(addr).await;
    let grid = next_grid(&mut ws).await;
    assert_eq!(
        next_message(&mut ws).await,
        ServerMessage::init(expected),
        "unexpected role assignment"
    );
    (ws, grid)
}

/// Walks green from its corner onto red's start cell on an open board,
/// reading both views after every step except the capturing one
async fn walk_green_onto_red(red: &mut Ws, green: &mut Ws) {
    let steps: Vec<&str> = std::iter::repeat("ArrowUp")
        .take(GRID_HEIGHT - 1)
        .chain(std::iter::repeat("ArrowLeft").take(GRID_WIDTH - 1))
        .collect();
    let last = steps.len() - 1;

    for (index, key) in steps.into_iter().enumerate() {
        send_key(green, key).await;
        if index == last {
            break;
        }
        next_grid(red).await;
        next_grid(green).await;
    }
}

fn blocked_layout(grid: &Grid) -> Vec<(usize, usize)> {
    let mut blocked = Vec::new();
    for (y, row) in grid.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if *cell == Cell::Blocked {
                blocked.push((x, y));
            }
        }
    }
    blocked
}

/// SESSION LIFECYCLE TESTS
mod session_tests {
    use super::*;

    #[tokio::test]
    async fn first_participant_gets_red_and_board() {
        let addr = start_server(random_board(3)).await;
        let (_ws, grid) = join(addr, Role::Red).await;

        assert_eq!(grid.len(), GRID_HEIGHT);
        assert!(grid.iter().all(|row| row.len() == GRID_WIDTH));
        assert_eq!(grid[0][0], Cell::Occupied(Role::Red));
        assert_eq!(grid[0][GRID_WIDTH - 1], Cell::Open);
        assert_eq!(grid[GRID_HEIGHT - 1][0], Cell::Open);
        assert_eq!(grid[GRID_HEIGHT - 1][GRID_WIDTH - 1], Cell::Open);
    }

    #[tokio::test]
    async fn roles_follow_join_order() {
        let addr = start_server(random_board(4)).await;

        let (mut red, _) = join(addr, Role::Red).await;
        let (_green, grid) = join(addr, Role::Green).await;
        let red_view = next_grid(&mut red).await;

        assert_eq!(grid, red_view);
        assert_eq!(
            grid[GRID_HEIGHT - 1][GRID_WIDTH - 1],
            Cell::Occupied(Role::Green)
        );

        let (_blue, grid) = join(addr, Role::Blue).await;
        assert_eq!(grid[0][GRID_WIDTH - 1], Cell::Occupied(Role::Blue));

        let (_yellow, grid) = join(addr, Role::Yellow).await;
        assert_eq!(grid[GRID_HEIGHT - 1][0], Cell::Occupied(Role::Yellow));
    }

    #[tokio::test]
    async fn fifth_participant_rejected() {
        let addr = start_server(random_board(5)).await;
        let _red = join(addr, Role::Red).await;
        let _green = join(addr, Role::Green).await;
        let _blue = join(addr, Role::Blue).await;
        let _yellow = join(addr, Role::Yellow).await;

        let mut extra = connect(addr).await;
        assert_eq!(
            next_message(&mut extra).await,
            ServerMessage::rejected("Server full")
        );

        let closed = timeout(RECV_TIMEOUT, extra.next())
            .await
            .expect("Timed out waiting for close");
        assert!(matches!(closed, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    }

    #[tokio::test]
    async fn leave_updates_remaining_participants() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;
        let (mut green, _) = join(addr, Role::Green).await;
        next_grid(&mut red).await;

        green.close(None).await.unwrap();

        let grid = next_grid(&mut red).await;
        assert_eq!(grid[GRID_HEIGHT - 1][GRID_WIDTH - 1], Cell::Open);
        assert_eq!(grid[0][0], Cell::Occupied(Role::Red));
    }

    #[tokio::test]
    async fn board_discarded_when_everyone_leaves() {
        let addr = start_server(random_board(6)).await;
        let (mut first, grid) = join(addr, Role::Red).await;
        let before = blocked_layout(&grid);

        first.close(None).await.unwrap();
        while let Ok(Some(_)) = timeout(RECV_TIMEOUT, first.next()).await {}
        sleep(Duration::from_millis(200)).await;

        let (_second, grid) = join(addr, Role::Red).await;
        assert_ne!(blocked_layout(&grid), before);
    }
}

/// MOVEMENT AND CAPTURE TESTS
mod gameplay_tests {
    use super::*;

    #[tokio::test]
    async fn move_right_shows_new_position() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;

        send_key(&mut red, "ArrowRight").await;

        let grid = next_grid(&mut red).await;
        assert_eq!(grid[0][1], Cell::Occupied(Role::Red));
        assert_eq!(grid[0][0], Cell::Open);
    }

    #[tokio::test]
    async fn move_into_edge_keeps_position() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;

        send_key(&mut red, "ArrowUp").await;
        let grid = next_grid(&mut red).await;
        assert_eq!(grid[0][0], Cell::Occupied(Role::Red));
    }

    #[tokio::test]
    async fn malformed_input_is_ignored() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;

        red.send(Message::text("not json")).await.unwrap();
        red.send(Message::text(r#"{"direction":"ArrowDown"}"#)).await.unwrap();
        send_key(&mut red, "Space").await;
        send_key(&mut red, "ArrowDown").await;

        // The first reply belongs to the only valid command
        let grid = next_grid(&mut red).await;
        assert_eq!(grid[1][0], Cell::Occupied(Role::Red));
    }

    #[tokio::test]
    async fn pursuer_reaching_evader_ends_game() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;
        let (mut green, _) = join(addr, Role::Green).await;
        next_grid(&mut red).await;

        walk_green_onto_red(&mut red, &mut green).await;

        for ws in [&mut red, &mut green] {
            assert_eq!(next_message(ws).await, ServerMessage::game_over());
            let grid = next_grid(ws).await;
            assert_eq!(grid[0][0], Cell::Occupied(Role::Green));
        }
    }

    #[tokio::test]
    async fn restart_resets_roles_positions_and_board() {
        let addr = start_server(random_board(8)).await;
        let (mut red, _) = join(addr, Role::Red).await;
        let (mut green, before) = join(addr, Role::Green).await;
        next_grid(&mut red).await;

        send_key(&mut green, "restart").await;

        for (ws, role) in [(&mut red, Role::Red), (&mut green, Role::Green)] {
            assert_eq!(next_message(ws).await, ServerMessage::init(role));
            assert_eq!(next_message(ws).await, ServerMessage::restart());

            let grid = next_grid(ws).await;
            assert_eq!(grid[0][0], Cell::Occupied(Role::Red));
            assert_eq!(
                grid[GRID_HEIGHT - 1][GRID_WIDTH - 1],
                Cell::Occupied(Role::Green)
            );
            assert_ne!(blocked_layout(&grid), blocked_layout(&before));
        }
    }

    #[tokio::test]
    async fn restart_after_capture_allows_movement() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;
        let (mut green, _) = join(addr, Role::Green).await;
        next_grid(&mut red).await;

        walk_green_onto_red(&mut red, &mut green).await;
        assert_eq!(next_event(&mut red).await, ServerEvent::GameOver);
        next_grid(&mut red).await;
        assert_eq!(next_event(&mut green).await, ServerEvent::GameOver);
        next_grid(&mut green).await;

        send_key(&mut red, "restart").await;
        assert_eq!(next_event(&mut red).await, ServerEvent::Init { color: Role::Red });
        assert_eq!(next_event(&mut red).await, ServerEvent::Restart);
        next_grid(&mut red).await;

        send_key(&mut red, "ArrowRight").await;
        let grid = next_grid(&mut red).await;
        assert_eq!(grid[0][1], Cell::Occupied(Role::Red));
    }
}

/// TERMINAL CLIENT TESTS
mod client_view_tests {
    use super::*;

    #[tokio::test]
    async fn client_tracks_role_and_board() {
        let addr = start_server(open_board()).await;
        let mut ws = connect(addr).await;
        let mut client = Client::new(&format!("ws://{}", addr));

        for _ in 0..2 {
            assert!(client.handle_text(&next_text(&mut ws).await));
        }
        assert_eq!(client.game_state().role, Some(Role::Red));
        assert!(client.game_state().accepts_input());

        send_key(&mut ws, "ArrowDown").await;
        assert!(client.handle_text(&next_text(&mut ws).await));

        let grid = client.game_state().grid.as_ref().unwrap();
        assert_eq!(grid[1][0], Cell::Occupied(Role::Red));
    }

    #[tokio::test]
    async fn late_joiner_waits_for_restart_after_capture() {
        let addr = start_server(open_board()).await;
        let (mut red, _) = join(addr, Role::Red).await;
        let (mut green, _) = join(addr, Role::Green).await;
        next_grid(&mut red).await;

        walk_green_onto_red(&mut red, &mut green).await;
        assert_eq!(next_event(&mut green).await, ServerEvent::GameOver);
        next_grid(&mut green).await;

        red.close(None).await.unwrap();
        next_grid(&mut green).await;

        let mut late = connect(addr).await;
        let mut client = Client::new(&format!("ws://{}", addr));
        for _ in 0..3 {
            assert!(client.handle_text(&next_text(&mut late).await));
        }

        assert_eq!(client.game_state().role, Some(Role::Red));
        assert!(client.game_state().game_over);
        assert!(!client.game_state().accepts_input());

        send_key(&mut late, "restart").await;
        assert_eq!(next_message(&mut late).await, ServerMessage::init(Role::Red));
        assert_eq!(next_message(&mut late).await, ServerMessage::restart());
        next_grid(&mut late).await;

        send_key(&mut late, "ArrowRight").await;
        let grid = next_grid(&mut late).await;
        assert_eq!(grid[0][1], Cell::Occupied(Role::Red));
    }
}
