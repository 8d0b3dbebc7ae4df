use crate::game::{ClientGameState, Update};
use crate::input::{next_action, InputAction};
use crate::rendering::render_screen;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{Command, ServerMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

pub struct Client {
    server_url: String,
    game_state: ClientGameState,
}

impl Client {
    pub fn new(server_url: &str) -> Self {
        Client {
            server_url: server_url.to_string(),
            game_state: ClientGameState::new(),
        }
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    /// Applies one text frame from the server. Returns false once the server
    /// has turned us away.
    pub fn handle_text(&mut self, text: &str) -> bool {
        let message = match ServerMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring unreadable server message: {}", e);
                return true;
            }
        };

        let update = self.game_state.apply(message);
        debug!("Applied {:?}", update);

        match update {
            Update::Role => info!("Assigned role {:?}", self.game_state.role),
            Update::GameOver => info!("Evader captured"),
            Update::Restarted => info!("Round restarted"),
            Update::Rejected => warn!("Server rejected the connection"),
            Update::Grid => {}
        }

        println!("{}\n", render_screen(&self.game_state));
        update != Update::Rejected
    }

    /// Encodes a command if the current round accepts input
    pub fn encode_command(&self, command: Command) -> Option<String> {
        let allowed = match command {
            Command::Move(_) => self.game_state.accepts_input(),
            Command::Restart => self.game_state.role.is_some(),
        };
        if !allowed {
            debug!("Not sending {:?} right now", command);
            return None;
        }

        match command.to_json() {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to encode {:?}: {}", command, e);
                None
            }
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_url);
        let (ws_stream, _) = connect_async(self.server_url.as_str()).await?;
        info!("Connected");

        let (mut write, mut read) = ws_stream.split();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if !self.handle_text(text.as_str()) {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Error receiving message: {}", e);
                            break;
                        }
                    }
                },

                action = next_action(&mut lines) => {
                    match action? {
                        InputAction::Send(command) => {
                            if let Some(text) = self.encode_command(command) {
                                write.send(Message::text(text)).await?;
                            }
                        }
                        InputAction::Quit => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
