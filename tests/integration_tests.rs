//! Integration tests for the pursuit session server.
//!
//! These tests run the real lobby and tick loop against loopback TCP
//! connections and validate the handshake, the pursuit, and the protocol's
//! error tolerance end to end.

use client::game::ClientGameState;
use server::game::run_game_loop;
use server::lobby::Lobby;
use server::session::Session;
use shared::protocol::{decode_line, Event};
use shared::world::open_world;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Binds a session server on an ephemeral port and runs lobby + tick loop
/// in the background.
async fn spawn_server(world_size: usize, tick_ms: u64, grace: Duration) -> SocketAddr {
    let session = Session::shared(Arc::new(open_world(world_size)));
    let lobby = Lobby::bind("127.0.0.1:0", Arc::clone(&session))
        .await
        .expect("bind lobby");
    let addr = lobby.local_addr().expect("local addr");

    tokio::spawn(async move {
        if lobby.run().await.is_ok() {
            run_game_loop(session, tick_ms, grace).await;
        }
    });

    addr
}

/// Minimal raw-protocol client for driving the server from tests.
struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let (reader, writer) = stream.into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .expect("send");
        self.writer.flush().await.expect("flush");
    }

    async fn next_line(&mut self) -> String {
        timeout(READ_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a server line")
            .expect("read")
            .expect("server closed the connection unexpectedly")
    }

    /// Reads lines until one starts with `prefix`, returning it.
    async fn next_line_with_prefix(&mut self, prefix: &str) -> String {
        loop {
            let line = self.next_line().await;
            if line.starts_with(prefix) {
                return line;
            }
        }
    }

    /// Asserts that nothing arrives within `window`.
    async fn expect_silence(&mut self, window: Duration) {
        let result = timeout(window, self.lines.next_line()).await;
        assert!(
            result.is_err(),
            "expected no traffic, got {:?}",
            result.unwrap()
        );
    }

    /// Completes the greeting (world + slot) and returns the slot.
    async fn greet(&mut self) -> u32 {
        let world_line = self.next_line().await;
        assert!(world_line.starts_with("world:"), "greeting was {:?}", world_line);
        let slot_line = self.next_line().await;
        let slot = slot_line
            .strip_prefix("player:")
            .unwrap_or_else(|| panic!("expected slot assignment, got {:?}", slot_line));
        slot.parse().expect("slot number")
    }
}

fn decoded(line: &str) -> Vec<Event> {
    decode_line(line)
        .into_iter()
        .map(|e| e.expect("server sent a malformed event"))
        .collect()
}

/// Single player on an open 17x17 grid: the monster starts at the center,
/// closes in monotonically, kills exactly once and ends with one name.
#[tokio::test]
async fn single_player_pursuit_runs_to_end() {
    let addr = spawn_server(17, 5, Duration::ZERO).await;
    let mut client = TestClient::connect(addr).await;
    let mut mirror = ClientGameState::new();

    assert_eq!(client.greet().await, 0);
    client.send("num:1").await;
    client.send("ready").await;
    client.next_line_with_prefix("begin").await;

    let mut last_distance = i32::MAX;
    let mut kills = 0;

    loop {
        let line = client.next_line().await;
        let mut finished = false;

        for event in decoded(&line) {
            mirror.apply(&event);
            match event {
                Event::Move { id: 0, x, y } => {
                    assert!((0..17).contains(&x) && (0..17).contains(&y));
                    let distance = x.abs() + y.abs();
                    assert!(
                        distance < last_distance,
                        "monster did not close in: {} -> {}",
                        last_distance,
                        distance
                    );
                    last_distance = distance;
                }
                Event::Kill(id) => {
                    assert_eq!(id, 1);
                    kills += 1;
                }
                Event::End(names) => {
                    assert_eq!(names, vec!["Player 1".to_string()]);
                    finished = true;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }

        if finished {
            break;
        }
    }

    assert_eq!(kills, 1, "kill must be broadcast exactly once");

    // The client-side mirror agrees with the broadcasts it saw.
    assert!(!mirror.entity(1).unwrap().alive);
    assert!(mirror.entity(0).unwrap().at(0, 0));
    assert_eq!(mirror.ranking, Some(vec!["Player 1".to_string()]));
}

/// With a required count of 2 the session stays in the lobby until both
/// players are connected and ready, and no third connection is served.
#[tokio::test]
async fn lobby_waits_for_full_roster() {
    let addr = spawn_server(9, 50, Duration::from_secs(60)).await;

    let mut host = TestClient::connect(addr).await;
    assert_eq!(host.greet().await, 0);

    // The second connection is not greeted until the host picks a count.
    let mut second = TestClient::connect(addr).await;
    host.send("num:2").await;
    assert_eq!(second.greet().await, 1);

    // One ready signal is not enough.
    host.send("ready").await;
    host.expect_silence(Duration::from_millis(200)).await;

    second.send("ready").await;
    assert_eq!(host.next_line().await, "begin");
    assert_eq!(second.next_line().await, "begin");

    // The lobby has handed off; a third connection is never serviced.
    sleep(Duration::from_millis(100)).await;
    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(stream) => {
            let mut lines = BufReader::new(stream).lines();
            let greeting = timeout(Duration::from_millis(300), lines.next_line()).await;
            match greeting {
                Err(_) => {}
                Ok(line) => assert_eq!(line.expect("read"), None, "extra player was greeted"),
            }
        }
    }
}

/// A malformed move is rejected without disconnecting the sender; later
/// valid lines from the same connection still work.
#[tokio::test]
async fn malformed_move_does_not_disconnect() {
    let addr = spawn_server(9, 50, Duration::from_secs(60)).await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.greet().await, 0);
    client.send("num:1").await;
    client.next_line_with_prefix("begin").await;

    client.send("mv:xx,1").await;
    client.send("mv:3,4").await;
    assert_eq!(client.next_line_with_prefix("mv:").await, "mv:1,3,4");

    client.send("mv:3,5").await;
    assert_eq!(client.next_line_with_prefix("mv:").await, "mv:1,3,5");
}

/// Moves onto blocked or out-of-range cells are dropped by the server.
#[tokio::test]
async fn invalid_moves_are_not_broadcast() {
    let addr = spawn_server(9, 50, Duration::from_secs(60)).await;
    let mut client = TestClient::connect(addr).await;

    assert_eq!(client.greet().await, 0);
    client.send("num:1").await;
    client.next_line_with_prefix("begin").await;

    client.send("mv:42,0").await;
    client.expect_silence(Duration::from_millis(200)).await;

    client.send("mv:1,0").await;
    assert_eq!(client.next_line_with_prefix("mv:").await, "mv:1,1,0");
}

/// A dropped connection is announced to the remaining players.
#[tokio::test]
async fn disconnect_is_broadcast() {
    let addr = spawn_server(9, 50, Duration::from_secs(60)).await;

    let mut host = TestClient::connect(addr).await;
    assert_eq!(host.greet().await, 0);
    let mut second = TestClient::connect(addr).await;
    host.send("num:2").await;
    assert_eq!(second.greet().await, 1);

    host.send("ready").await;
    second.send("ready").await;
    assert_eq!(host.next_line().await, "begin");
    assert_eq!(second.next_line().await, "begin");

    drop(second);
    assert_eq!(host.next_line_with_prefix("dc:").await, "dc:2");
}
