//! Types shared between the pursuit server and its clients: the entity
//! model, the line-oriented wire protocol and the grid world.

pub mod protocol;
pub mod world;

/// Entity id reserved for the server-controlled monster.
pub const MONSTER_ID: u32 = 0;
/// Highest supported player count per session (one spawn corner each).
pub const MAX_PLAYERS: u32 = 4;
/// Default listening port for a session server.
pub const DEFAULT_PORT: u16 = 3286;
/// Starting tick interval for the session coordinator, in milliseconds.
pub const INITIAL_TICK_MS: u64 = 500;

/// One game entity: the monster (id 0) or a player (id >= 1).
///
/// The server owns the canonical position of every entity; clients keep a
/// mirrored copy for presentation. Rank is assigned once, at death.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    /// Zero-based elimination order; `None` until the entity dies.
    pub rank: Option<u32>,
    /// Client-reported survival time in seconds.
    pub survival_time: Option<f32>,
}

impl Entity {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            alive: true,
            rank: None,
            survival_time: None,
        }
    }

    pub fn set_pos(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }
}

/// Initial position for an entity on a `size`-by-`size` grid: the monster
/// spawns at the center, players 1 through 4 at the corners. Ids beyond the
/// supported roster fall back to the origin.
pub fn spawn_position(id: u32, size: i32) -> (i32, i32) {
    match id {
        MONSTER_ID => (size / 2, size / 2),
        1 => (0, 0),
        2 => (size - 1, 0),
        3 => (0, size - 1),
        4 => (size - 1, size - 1),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_creation() {
        let entity = Entity::new(3, 4, 5);
        assert_eq!(entity.id, 3);
        assert_eq!(entity.x, 4);
        assert_eq!(entity.y, 5);
        assert!(entity.alive);
        assert_eq!(entity.rank, None);
        assert_eq!(entity.survival_time, None);
    }

    #[test]
    fn test_entity_position_checks() {
        let mut entity = Entity::new(1, 0, 0);
        entity.set_pos(7, 2);
        assert!(entity.at(7, 2));
        assert!(!entity.at(2, 7));
    }

    #[test]
    fn test_entity_kill() {
        let mut entity = Entity::new(1, 0, 0);
        entity.kill();
        assert!(!entity.alive);
    }

    #[test]
    fn test_spawn_positions_are_distinct() {
        let size = 17;
        let positions: Vec<(i32, i32)> = (0..=MAX_PLAYERS)
            .map(|id| spawn_position(id, size))
            .collect();

        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                assert_ne!(positions[i], positions[j]);
            }
        }
    }

    #[test]
    fn test_monster_spawns_at_center() {
        assert_eq!(spawn_position(MONSTER_ID, 17), (8, 8));
        assert_eq!(spawn_position(MONSTER_ID, 1), (0, 0));
    }

    #[test]
    fn test_unknown_id_spawns_at_origin() {
        assert_eq!(spawn_position(9, 17), (0, 0));
    }
}
