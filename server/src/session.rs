//! Shared session context: the one object every task works through.
//!
//! The lobby appends players while accepting, each connection's reader task
//! pushes decoded events in, and the coordinator reads counts and moves the
//! monster. All of it happens under a single `RwLock` scoped to the session;
//! with at most a handful of players no finer-grained locking is needed.

use crate::connection::PlayerHandle;
use log::{debug, info, warn};
use shared::protocol::{self, Event};
use shared::world::World;
use shared::{spawn_position, Entity, MAX_PLAYERS, MONSTER_ID};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

pub type SharedSession = Arc<RwLock<Session>>;

/// Per-server-instance session state.
///
/// Created when the process starts, mutated through the lobby handshake and
/// the tick loop, torn down when the game concludes or everyone leaves.
pub struct Session {
    world: Arc<World>,
    /// Players in join order; the vector index is the connection slot.
    players: Vec<PlayerHandle>,
    pub monster: Entity,
    /// Requested player count; `None` until the host's `num` arrives.
    required_players: Option<u32>,
    ready_count: u32,
    next_rank: u32,
    finished: bool,
}

impl Session {
    pub fn new(world: Arc<World>) -> Self {
        let (mx, my) = spawn_position(MONSTER_ID, world.size());
        Self {
            world,
            players: Vec::new(),
            monster: Entity::new(MONSTER_ID, mx, my),
            required_players: None,
            ready_count: 0,
            next_rank: 0,
            finished: false,
        }
    }

    pub fn shared(world: Arc<World>) -> SharedSession {
        Arc::new(RwLock::new(Self::new(world)))
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Registers a newly accepted connection and returns its slot. Slots are
    /// sequential in join order; the player's entity id is slot + 1 so the
    /// monster keeps id 0 to itself.
    pub fn add_player(&mut self, sender: mpsc::UnboundedSender<String>) -> usize {
        let slot = self.players.len();
        let entity_id = slot as u32 + 1;
        let (x, y) = spawn_position(entity_id, self.world.size());
        self.players
            .push(PlayerHandle::new(slot, Entity::new(entity_id, x, y), sender));
        slot
    }

    /// Sends a batch of events to every connected player as one line.
    pub fn broadcast(&self, events: &[Event]) {
        let line = protocol::encode_line(events);
        for player in self.players.iter().filter(|p| p.connected) {
            player.send_line(&line);
        }
    }

    pub fn send_to(&self, slot: usize, event: &Event) {
        if let Some(player) = self.players.get(slot) {
            player.send_event(event);
        }
    }

    /// Applies one decoded event from a client's reader task.
    pub fn handle_event(&mut self, slot: usize, event: Event) {
        match event {
            Event::MoveRequest { x, y } => self.handle_move(slot, x, y),
            Event::PlayerCount(n) => self.set_required_players(n),
            Event::Ready => {
                self.ready_count += 1;
                info!("{} player(s) ready", self.ready_count);
            }
            Event::SurvivalTime(secs) => {
                if let Some(player) = self.players.get_mut(slot) {
                    player.entity.survival_time = Some(secs);
                }
            }
            other => warn!("player {}: unexpected event {:?}", slot, other),
        }
    }

    /// Validates a move request and, if acceptable, updates the canonical
    /// position and broadcasts it. Late input after the session finished and
    /// input from dead players are dropped without effect.
    fn handle_move(&mut self, slot: usize, x: i32, y: i32) {
        if self.finished {
            debug!("player {}: move after session end ignored", slot);
            return;
        }
        let Some(player) = self.players.get_mut(slot) else {
            return;
        };
        if !player.entity.alive {
            return;
        }
        if !self.world.is_accessible(x, y) {
            warn!(
                "player {}: rejected move to inaccessible cell ({}, {})",
                slot, x, y
            );
            return;
        }

        player.entity.set_pos(x, y);
        let id = player.entity.id;
        self.broadcast(&[Event::Move { id, x, y }]);
    }

    fn set_required_players(&mut self, n: u32) {
        if self.required_players.is_some() {
            warn!("player count already set, ignoring num:{}", n);
            return;
        }
        let clamped = n.clamp(1, MAX_PLAYERS);
        if clamped != n {
            warn!("requested player count {} clamped to {}", n, clamped);
        }
        info!("session requires {} player(s)", clamped);
        self.required_players = Some(clamped);
    }

    /// Marks a player disconnected and tells everyone else. Safe to call at
    /// any point; the coordinator tolerates the flag flipping between ticks.
    pub fn handle_disconnect(&mut self, slot: usize) {
        let Some(player) = self.players.get_mut(slot) else {
            return;
        };
        if !player.connected {
            return;
        }
        player.connected = false;
        let id = player.entity.id;
        info!("player {} disconnected", slot);
        self.broadcast(&[Event::Disconnected(id)]);
    }

    /// Starts the running phase: places the monster at the grid center and
    /// announces the simulation start.
    pub fn begin(&mut self) {
        let (mx, my) = spawn_position(MONSTER_ID, self.world.size());
        self.monster = Entity::new(MONSTER_ID, mx, my);
        self.broadcast(&[Event::Begin]);
        info!("{} players ready, starting game", self.players.len());
    }

    /// Kills every connected, alive player standing on the monster's cell.
    /// Ranks are assigned in death order, 0 first. Returns the entity ids
    /// broadcast as kills.
    pub fn reap(&mut self) -> Vec<u32> {
        let (mx, my) = (self.monster.x, self.monster.y);
        let mut killed = Vec::new();

        for player in &mut self.players {
            if player.connected && player.entity.alive && player.entity.at(mx, my) {
                player.entity.kill();
                player.entity.rank = Some(self.next_rank);
                self.next_rank += 1;
                info!("player {} died (rank {})", player.slot, self.next_rank - 1);
                killed.push(player.entity.id);
            }
        }

        for id in &killed {
            self.broadcast(&[Event::Kill(*id)]);
        }
        killed
    }

    /// Display names in elimination order, rank 0 first.
    pub fn ranked_names(&self) -> Vec<String> {
        (0..self.next_rank)
            .filter_map(|rank| {
                self.players
                    .iter()
                    .find(|p| p.entity.rank == Some(rank))
                    .map(|p| p.name.clone())
            })
            .collect()
    }

    /// Positions of pursuit candidates: connected, alive players.
    pub fn target_candidates(&self) -> Vec<(u32, (i32, i32))> {
        self.players
            .iter()
            .filter(|p| p.connected && p.entity.alive)
            .map(|p| (p.entity.id, (p.entity.x, p.entity.y)))
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn required_players(&self) -> Option<u32> {
        self.required_players
    }

    pub fn ready_count(&self) -> u32 {
        self.ready_count
    }

    /// Players still in the chase. Disconnected players are excluded so a
    /// vanished client cannot keep the session alive forever.
    pub fn alive_players(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.connected && p.entity.alive)
            .count()
    }

    pub fn connected_players(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Closes every connection's outbound queue.
    pub fn close_all(&mut self) {
        for player in &mut self.players {
            player.close();
        }
    }
}
