//! # Grid Chase Server Library
//!
//! This library provides the authoritative server for a small real-time chase
//! game. Up to four participants share one grid board; one of them (red) is
//! the evader and the others try to step onto its cell. The server owns the
//! board, validates every move and broadcasts the resulting state.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! The server holds the only copy of the board and of every participant's
//! position. Clients send key presses and render whatever grid they receive
//! next; they never move themselves.
//!
//! ### Session Management
//! Handles the lifecycle of participants:
//! - Role and start corner assignment on join
//! - Capacity enforcement (four roles, a fifth connection is turned away)
//! - Board teardown once the last participant leaves
//!
//! ### State Broadcasting
//! After every state change the board is re-rendered with all participants
//! stamped on it and sent to every active connection.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! Each WebSocket runs in its own task, but those tasks only shuttle frames.
//! Joins, commands and disconnects are funneled through one channel into the
//! server loop, which handles them strictly one after another. No lock guards
//! the game state because nothing else can reach it.
//!
//! ### Transport-Free Game Logic
//! [`game::GameState`] turns an event into a list of addressed outbound
//! messages. The network layer only serializes and queues them, so the
//! whole game can be exercised in tests without sockets.
//!
//! ### Non-Blocking Fan-Out
//! Every connection has a bounded outbound queue. Sends never wait: a full
//! or closed queue drops the message for that connection only.
//!
//! ## Module Organization
//!
//! ### Grid Module (`grid`)
//! Board generation with random blocked cells, move validation and snapshot
//! rendering, plus capture detection.
//!
//! ### Client Manager Module (`client_manager`)
//! Participant registry: ordinals, the fixed role table and start corners.
//!
//! ### Game Module (`game`)
//! Session state machine tying the registry and the board together.
//!
//! ### Network Module (`network`)
//! WebSocket accept loop, per-connection tasks and message dispatch.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::GameSettings;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new("127.0.0.1:8080", GameSettings::default()).await?;
//!
//!     // Accepts WebSocket connections, joins them to the shared session and
//!     // broadcasts the board after every move, restart and disconnect
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod game;
pub mod grid;
pub mod network;
