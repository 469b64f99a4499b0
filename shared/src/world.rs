//! The session's grid world.
//!
//! A world is a square grid loaded once per session from a text file where
//! each line is one row and each character one cell (`'1'` blocked, anything
//! else open). On the wire the same rows travel comma-joined inside the
//! `world:` event.

use std::path::Path;
use thiserror::Error;

const BLOCKED: u8 = b'1';

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("world has no rows")]
    Empty,
    #[error("world is not square: row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("failed to read world file: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable-for-the-session square grid.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    rows: Vec<String>,
}

impl World {
    /// Builds a world from row strings, validating that the grid is a
    /// non-empty square.
    pub fn new(rows: Vec<String>) -> Result<Self, WorldError> {
        if rows.is_empty() {
            return Err(WorldError::Empty);
        }
        let expected = rows.len();
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(WorldError::NotSquare {
                    row,
                    len: cells.len(),
                    expected,
                });
            }
        }
        Ok(Self { rows })
    }

    /// Reads a world from a newline-delimited text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let text = std::fs::read_to_string(path)?;
        Self::new(
            text.lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Parses the comma-joined form carried by the `world:` event.
    pub fn from_wire(wire: &str) -> Result<Self, WorldError> {
        Self::new(
            wire.split(',')
                .filter(|row| !row.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Comma-joined form for the `world:` event.
    pub fn to_wire(&self) -> String {
        self.rows.join(",")
    }

    pub fn size(&self) -> i32 {
        self.rows.len() as i32
    }

    /// True when `(x, y)` is inside the grid and not a blocked cell.
    pub fn is_accessible(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.size() || y >= self.size() {
            return false;
        }
        self.rows[y as usize].as_bytes()[x as usize] != BLOCKED
    }
}

/// A fully open `size`-by-`size` grid; used by tests and as a fallback map.
pub fn open_world(size: usize) -> World {
    World::new(vec!["0".repeat(size); size]).expect("open grid is square")
}
