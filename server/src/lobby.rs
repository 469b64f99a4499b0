//! Session lobby: accepts connections and runs the ready handshake.
//!
//! The lobby moves through `WAITING_FOR_PLAYERS -> WAITING_FOR_COUNT ->
//! READY -> RUNNING`. The first client to join is the host; its `num` event
//! fixes the roster size, and the lobby waits for it with no timeout (the
//! original behaved the same way). A required count of 1 starts the session
//! the moment that one player is connected, skipping the ready gate.

use crate::connection::{spawn_reader, spawn_writer};
use crate::session::SharedSession;
use log::{error, info};
use shared::protocol::Event;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::sleep;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Lobby {
    listener: TcpListener,
    session: SharedSession,
}

impl Lobby {
    pub async fn bind(addr: &str, session: SharedSession) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("waiting for players on {}", listener.local_addr()?);
        Ok(Self { listener, session })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the handshake to completion and hands the session over to the
    /// coordinator. The listener is dropped on return, so no connection
    /// beyond the required count is ever accepted.
    pub async fn run(self) -> io::Result<()> {
        // WAITING_FOR_PLAYERS: the host joins first.
        self.accept_player().await?;

        // WAITING_FOR_COUNT: block until the host picks a roster size.
        info!("waiting for player count from the host");
        let required = loop {
            if let Some(n) = self.session.read().await.required_players() {
                break n;
            }
            sleep(POLL_INTERVAL).await;
        };

        // A one-player session short-circuits the ready gate entirely.
        if required > 1 {
            while self.session.read().await.player_count() < required as usize {
                self.accept_player().await?;
            }

            // READY: everyone accepted; wait for their ready signals.
            while self.session.read().await.ready_count() < required {
                sleep(POLL_INTERVAL).await;
            }
        }

        // RUNNING: announce the start and hand off.
        self.session.write().await.begin();
        Ok(())
    }

    /// Accepts one connection, greets it with the world and its slot, and
    /// spawns its reader task. A failed accept is reported and retried; it
    /// aborts only that connection attempt, never the lobby.
    async fn accept_player(&self) -> io::Result<()> {
        let (stream, addr) = loop {
            match self.listener.accept().await {
                Ok(accepted) => break accepted,
                Err(e) => {
                    error!("error connecting to player: {}", e);
                    sleep(POLL_INTERVAL).await;
                }
            }
        };

        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_writer(writer, rx);

        let slot = {
            let mut session = self.session.write().await;
            let slot = session.add_player(tx);
            let world_wire = session.world().to_wire();
            session.send_to(slot, &Event::World(world_wire));
            session.send_to(slot, &Event::AssignSlot(slot as u32));
            slot
        };

        spawn_reader(self.session.clone(), slot, reader);
        info!("player {} connected from {}", slot, addr);
        Ok(())
    }
}
