//! Server network layer handling WebSocket connections and event dispatch

use crate::client_manager::ConnectionId;
use crate::game::{GameSettings, GameState, Outbound, Recipient};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{Command, ServerMessage};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Messages a single connection may queue before further sends are dropped
pub const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Events sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum NetworkEvent {
    Connected {
        connection_id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::Sender<Message>,
    },
    Received {
        connection_id: ConnectionId,
        text: String,
    },
    Closed {
        connection_id: ConnectionId,
    },
}

/// Lifecycle of a transport connection as seen by the main loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake done, not yet admitted to the session
    Connecting,
    /// Admitted; receives broadcasts
    Active,
    /// Rejected or gone; nothing more is sent
    Closed,
}

/// Main loop's handle on one connection
#[derive(Debug)]
pub struct Connection {
    pub addr: SocketAddr,
    pub state: ConnectionState,
    sender: mpsc::Sender<Message>,
}

impl Connection {
    pub fn new(addr: SocketAddr, sender: mpsc::Sender<Message>) -> Self {
        Self {
            addr,
            state: ConnectionState::Connecting,
            sender,
        }
    }

    /// Queues a message without waiting. A full or closed queue drops the
    /// message so a slow peer never holds up the loop.
    pub fn try_send(&self, message: Message) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for {}, dropping message", self.addr);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Connection {} already closed", self.addr);
                false
            }
        }
    }
}

/// WebSocket server owning the game session
pub struct Server {
    listener: TcpListener,
    game_state: GameState,
    connections: HashMap<ConnectionId, Connection>,
    next_connection_id: ConnectionId,

    // Communication channels
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    event_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    pub async fn new(addr: &str, settings: GameSettings) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            game_state: GameState::new(settings),
            connections: HashMap::new(),
            next_connection_id: 1,
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main server loop. Accepts connections and handles every connection
    /// event to completion before taking the next one. Runs until the
    /// caller drops the future.
    pub async fn run(&mut self) -> io::Result<()> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let connection_id = self.next_connection_id;
                            self.next_connection_id += 1;
                            self.spawn_connection(stream, addr, connection_id);
                        }
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                },

                Some(event) = self.event_rx.recv() => self.handle_event(event),
            }
        }
    }

    /// Spawns the task that owns one socket
    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr, connection_id: ConnectionId) {
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            serve_connection(stream, addr, connection_id, events).await;
        });
    }

    fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::Connected {
                connection_id,
                addr,
                sender,
            } => self.admit(connection_id, addr, sender),

            NetworkEvent::Received {
                connection_id,
                text,
            } => match Command::parse(&text) {
                Ok(command) => {
                    let outbound = self.game_state.handle_command(connection_id, command);
                    self.dispatch(outbound);
                }
                Err(e) => debug!("Dropping message from {}: {}", connection_id, e),
            },

            NetworkEvent::Closed { connection_id } => {
                if let Some(mut connection) = self.connections.remove(&connection_id) {
                    connection.state = ConnectionState::Closed;
                    info!("Connection {} from {} closed", connection_id, connection.addr);
                }
                let outbound = self.game_state.on_leave(connection_id);
                self.dispatch(outbound);
            }
        }
    }

    /// Joins a freshly handshaken connection to the session, or turns it
    /// away when every role is taken
    fn admit(&mut self, connection_id: ConnectionId, addr: SocketAddr, sender: mpsc::Sender<Message>) {
        let mut connection = Connection::new(addr, sender);

        match self.game_state.on_join(connection_id) {
            Ok(outbound) => {
                connection.state = ConnectionState::Active;
                self.connections.insert(connection_id, connection);
                self.dispatch(outbound);
            }
            Err(e) => {
                warn!("Rejecting connection {} from {}: {}", connection_id, addr, e);
                if let Some(text) = encode(&ServerMessage::rejected("Server full")) {
                    connection.try_send(Message::text(text));
                }
                connection.try_send(Message::Close(None));
                connection.state = ConnectionState::Closed;
            }
        }
    }

    /// Serializes each message once and queues it on every addressed,
    /// active connection
    fn dispatch(&self, outbound: Vec<Outbound>) {
        for Outbound { recipient, message } in outbound {
            let Some(text) = encode(&message) else {
                continue;
            };

            match recipient {
                Recipient::One(connection_id) => {
                    if let Some(connection) = self.connections.get(&connection_id) {
                        if connection.state == ConnectionState::Active {
                            connection.try_send(Message::text(text));
                        }
                    }
                }
                Recipient::All => {
                    for connection in self.connections.values() {
                        if connection.state == ConnectionState::Active {
                            connection.try_send(Message::text(text.clone()));
                        }
                    }
                }
            }
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match message.to_json() {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize {:?}: {}", message, e);
            None
        }
    }
}

/// Runs the WebSocket handshake, then pumps frames in both directions until
/// either side goes away
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_id: ConnectionId,
    events: mpsc::UnboundedSender<NetworkEvent>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    info!("Connection {} established from {}", connection_id, addr);

    let (mut write, mut read) = ws_stream.split();
    let (sender, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_SIZE);

    if events
        .send(NetworkEvent::Connected {
            connection_id,
            addr,
            sender,
        })
        .is_err()
    {
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = write.send(message).await {
                debug!("Send to {} failed: {}", addr, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    let inbound = events.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let event = NetworkEvent::Received {
                        connection_id,
                        text: text.as_str().to_owned(),
                    };
                    if inbound.send(event).is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Read from {} failed: {}", addr, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Err(e) = events.send(NetworkEvent::Closed { connection_id }) {
        error!("Failed to report close of {}: {}", connection_id, e);
    }
}
