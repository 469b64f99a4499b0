//! # Pursuit Session Server
//!
//! Authoritative server for the grid pursuit game: clients connect over
//! TCP, receive the shared world, and are chased by the server-controlled
//! monster until everyone is caught or gone.
//!
//! The server is organized around one explicit session context shared by
//! every task (no globals):
//!
//! - [`lobby`] accepts connections and runs the ready/player-count
//!   handshake, greeting each client with the world and its slot.
//! - [`connection`] wraps one client socket: a reader task dispatching
//!   decoded protocol events and a writer task draining an outbound queue.
//! - [`session`] holds the shared state — players in join order, the world,
//!   the monster, counters — behind a single session-scoped lock.
//! - [`monster`] is the stateless pursuit AI.
//! - [`game`] runs the tick loop: AI step, interval decay, collision kills,
//!   and game-over sequencing.
//!
//! Concurrency model: one spawned task per connection direction plus one
//! for the tick loop, all communicating through the lock-guarded session.
//! Outbound writes go through per-connection unbounded queues, so a slow
//! client delays only its own writer task, never the tick loop.

pub mod connection;
pub mod game;
pub mod lobby;
pub mod monster;
pub mod session;
