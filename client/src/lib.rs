//! # Grid Chase Terminal Client
//!
//! A headless client for the grid chase server. It renders each received
//! board as ASCII in the terminal and turns typed lines into key commands.
//! The server stays authoritative: the client never moves anything itself,
//! it only redraws whatever grid arrives next.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Local view of the session: assigned role, last grid, game-over flag.
//! Input is withheld between a `gameOver` and the next `restart`.
//!
//! ### Input Module (`input`)
//! Maps stdin lines (`w/a/s/d`, arrow names, `r`, `q`) to protocol commands.
//!
//! ### Network Module (`network`)
//! WebSocket connection driving both directions from one select loop.
//!
//! ### Rendering Module (`rendering`)
//! Status line and grid drawing.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("ws://127.0.0.1:8080");
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
