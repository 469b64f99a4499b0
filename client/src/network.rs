//! Network client: one TCP connection to the session server.
//!
//! The client owns the local state mirror and a line reader over the socket.
//! Incoming lines are decoded and applied to the mirror; the handful of
//! protocol replies the handshake needs (`num`, `ready`, `time`) are sent
//! from here so the mirror itself stays I/O-free. Move commands arrive from
//! the terminal and go out as `mv` requests after local validation.

use crate::game::ClientGameState;
use log::{info, warn};
use shared::protocol::{self, Event};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    pub state: ClientGameState,
    /// Roster size this client requests if it turns out to be the host.
    players_wanted: u32,
}

impl Client {
    pub async fn connect(addr: &str, players_wanted: u32) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("connected to server at {}", addr);

        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
            state: ClientGameState::new(),
            players_wanted,
        })
    }

    pub async fn send(&mut self, events: &[Event]) -> io::Result<()> {
        let mut line = protocol::encode_line(events);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }

    /// Runs until the game ends or the server closes the connection.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if self.handle_line(&line).await? {
                                return Ok(());
                            }
                        }
                        None => {
                            info!("server closed the connection");
                            return Ok(());
                        }
                    }
                }
                command = next_command(&mut input) => {
                    if let Some(command) = command {
                        self.handle_command(&command).await?;
                    }
                }
            }
        }
    }

    /// Decodes one server line and applies it. Returns true once the final
    /// ranking has arrived and the session is over.
    pub async fn handle_line(&mut self, line: &str) -> io::Result<bool> {
        for decoded in protocol::decode_line(line) {
            let event = match decoded {
                Ok(event) => event,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            self.state.apply(&event);

            match event {
                Event::AssignSlot(slot) => {
                    // The host picks the roster size before signalling ready.
                    if slot == 0 {
                        self.send(&[Event::PlayerCount(self.players_wanted)]).await?;
                    }
                    self.send(&[Event::Ready]).await?;
                }
                Event::Begin => {
                    info!("game on - the monster is coming");
                }
                Event::Kill(id) if Some(id) == self.state.local_id => {
                    info!("you were caught");
                    if let Some(secs) = self.state.survival_secs() {
                        self.send(&[Event::SurvivalTime(secs)]).await?;
                    }
                }
                Event::End(_) => {
                    if let Some(ranking) = &self.state.ranking {
                        println!("Game over! Elimination order: {}", ranking.join(", "));
                    }
                    return Ok(true);
                }
                _ => {}
            }
        }
        Ok(false)
    }

    /// Turns one terminal command into a validated move request.
    async fn handle_command(&mut self, command: &str) -> io::Result<()> {
        let Some((dx, dy)) = parse_direction(command) else {
            warn!("unknown command {:?} (use up/down/left/right or w/a/s/d)", command);
            return Ok(());
        };

        let Some(local) = self.state.local_entity() else {
            return Ok(());
        };
        if !local.alive || !self.state.begun {
            return Ok(());
        }

        let (x, y) = (local.x + dx, local.y + dy);
        if self.state.can_move(x, y) {
            self.send(&[Event::MoveRequest { x, y }]).await?;
        }
        Ok(())
    }
}

async fn next_command(input: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    input.next_line().await.ok().flatten()
}

/// Maps a terminal command to a unit step on the grid.
pub fn parse_direction(command: &str) -> Option<(i32, i32)> {
    match command.trim().to_ascii_lowercase().as_str() {
        "up" | "w" => Some((0, -1)),
        "down" | "s" => Some((0, 1)),
        "left" | "a" => Some((-1, 0)),
        "right" | "d" => Some((1, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_words() {
        assert_eq!(parse_direction("up"), Some((0, -1)));
        assert_eq!(parse_direction("down"), Some((0, 1)));
        assert_eq!(parse_direction("left"), Some((-1, 0)));
        assert_eq!(parse_direction("right"), Some((1, 0)));
    }

    #[test]
    fn test_direction_keys_and_whitespace() {
        assert_eq!(parse_direction(" W "), Some((0, -1)));
        assert_eq!(parse_direction("d"), Some((1, 0)));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_direction("jump"), None);
        assert_eq!(parse_direction(""), None);
    }
}
