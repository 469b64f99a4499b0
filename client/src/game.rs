//! Client-side mirror of the session state.
//!
//! Every event decoded off the wire is applied here: entity positions,
//! life/death, the world snapshot and the final ranking. The mirror performs
//! no validation beyond what the codec already guarantees and never touches
//! the connection itself; a move referencing an entity the mirror has never
//! seen simply creates it.

use log::warn;
use shared::protocol::Event;
use shared::world::World;
use shared::{spawn_position, Entity, MONSTER_ID};
use std::time::Instant;

pub struct ClientGameState {
    entities: Vec<Entity>,
    pub world: Option<World>,
    /// Entity id of the locally controlled player, once assigned.
    pub local_id: Option<u32>,
    /// Final ranking, display names in elimination order, once the game ends.
    pub ranking: Option<Vec<String>>,
    pub begun: bool,
    started_at: Option<Instant>,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            world: None,
            local_id: None,
            ranking: None,
            begun: false,
            started_at: None,
        }
    }

    /// Applies one server event to the mirror.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::World(rows) => match World::from_wire(rows) {
                Ok(world) => self.world = Some(world),
                Err(e) => warn!("ignoring unusable world snapshot: {}", e),
            },
            Event::AssignSlot(slot) => {
                // Slot 0 is the first player; entity id 0 stays the monster's.
                let id = slot + 1;
                self.get_or_create(id);
                self.local_id = Some(id);
            }
            Event::Begin => {
                self.get_or_create(MONSTER_ID);
                self.begun = true;
                self.started_at = Some(Instant::now());
            }
            Event::Move { id, x, y } => {
                self.get_or_create(*id).set_pos(*x, *y);
            }
            Event::Kill(id) => {
                self.get_or_create(*id).kill();
            }
            Event::Disconnected(id) => {
                // A vanished player leaves its entity frozen and lifeless.
                self.get_or_create(*id).kill();
            }
            Event::End(names) => {
                self.ranking = Some(names.clone());
            }
            other => warn!("unexpected event from server: {:?}", other),
        }
    }

    /// Looks an entity up by id, creating it at its spawn position (or the
    /// origin for ids beyond the roster) if the mirror has not seen it yet.
    pub fn get_or_create(&mut self, id: u32) -> &mut Entity {
        if let Some(index) = self.entities.iter().position(|e| e.id == id) {
            return &mut self.entities[index];
        }
        let size = self.world.as_ref().map_or(0, |w| w.size());
        let (x, y) = spawn_position(id, size);
        self.entities.push(Entity::new(id, x, y));
        self.entities.last_mut().expect("just pushed")
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn local_entity(&self) -> Option<&Entity> {
        self.local_id.and_then(|id| self.entity(id))
    }

    /// Whether the local player may step onto `(x, y)`: inside the grid, on
    /// an open cell, and not already occupied by any entity.
    pub fn can_move(&self, x: i32, y: i32) -> bool {
        let Some(world) = &self.world else {
            return false;
        };
        if !world.is_accessible(x, y) {
            return false;
        }
        !self.entities.iter().any(|e| e.at(x, y))
    }

    /// Seconds survived since `begin`, for the `time` report sent after the
    /// local player's death.
    pub fn survival_secs(&self) -> Option<f32> {
        self.started_at.map(|t| t.elapsed().as_secs_f32())
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}
