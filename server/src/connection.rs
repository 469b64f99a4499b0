//! Server-side handle for one client connection.
//!
//! Each accepted socket is split in two: a writer task drains an unbounded
//! outbound queue so a stalled client can never block the tick loop, and a
//! reader task consumes newline-delimited input until end-of-stream,
//! dispatching decoded events into the shared session. Stream closure flips
//! the handle to disconnected and is announced to the remaining players.

use crate::session::SharedSession;
use log::{debug, warn};
use shared::protocol::{self, Event};
use shared::Entity;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;

/// One remote participant as the session sees it.
#[derive(Debug)]
pub struct PlayerHandle {
    /// Connection slot, in join order starting at 0.
    pub slot: usize,
    /// The player's canonical entity (id = slot + 1).
    pub entity: Entity,
    pub name: String,
    pub connected: bool,
    sender: Option<mpsc::UnboundedSender<String>>,
}

impl PlayerHandle {
    pub fn new(slot: usize, entity: Entity, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            slot,
            entity,
            name: format!("Player {}", slot + 1),
            connected: true,
            sender: Some(sender),
        }
    }

    /// Queues one protocol line for this client. Best-effort: a closed
    /// queue only means the writer task already observed the disconnect.
    pub fn send_line(&self, line: &str) {
        if let Some(sender) = &self.sender {
            if sender.send(line.to_string()).is_err() {
                debug!("player {}: outbound queue closed", self.slot);
            }
        }
    }

    pub fn send_event(&self, event: &Event) {
        self.send_line(&protocol::encode(event));
    }

    /// Releases the outbound queue; once the writer task drains what is
    /// already queued it drops the write half, closing the stream.
    pub fn close(&mut self) {
        self.sender = None;
        self.connected = false;
    }
}

/// Spawns the task that writes queued lines to the client.
pub fn spawn_writer(mut writer: OwnedWriteHalf, mut outbound: mpsc::UnboundedReceiver<String>) {
    tokio::spawn(async move {
        while let Some(line) = outbound.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
        }
    });
}

/// Spawns the task that reads the client's lines until the stream closes.
///
/// Every decoded event goes through the session; a malformed event is
/// logged and skipped without touching the connection, so the next valid
/// line from the same client is still processed.
pub fn spawn_reader(session: SharedSession, slot: usize, reader: OwnedReadHalf) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for decoded in protocol::decode_line(&line) {
                        match decoded {
                            Ok(event) => session.write().await.handle_event(slot, event),
                            Err(e) => warn!("player {}: {}", slot, e),
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("player {}: read failed: {}", slot, e);
                    break;
                }
            }
        }

        session.write().await.handle_disconnect(slot);
    });
}
