//! Headless client for the pursuit session server.
//!
//! [`network`] holds the TCP connection and the protocol handshake;
//! [`game`] is the local mirror of the server's state. Presentation is
//! deliberately out of scope: the binary drives moves from the terminal
//! and any renderer would read the same mirror.

pub mod game;
pub mod network;
