//! The session coordinator: the authoritative tick loop.

use crate::monster;
use crate::session::SharedSession;
use log::{debug, info};
use shared::protocol::Event;
use shared::MONSTER_ID;
use std::time::Duration;
use tokio::time::sleep;

/// Tick interval decay: 1% faster each tick, rounded to the nearest whole
/// millisecond. Rounding gives the decay a natural floor — once 1% of the
/// interval is under half a millisecond the value stops shrinking (at 50 ms
/// for the default start), so the loop can never busy-spin.
pub fn decay_tick(interval_ms: u64) -> u64 {
    ((interval_ms as f64 * 0.99).round() as u64).max(1)
}

/// Runs the tick loop after lobby handoff. Each tick: sleep, move the
/// monster one step and publish it, speed up, kill every player caught on
/// the monster's cell. The loop ends with a ranked `end` broadcast once no
/// player is left alive, or silently once no player is left connected.
pub async fn run_game_loop(session: SharedSession, initial_tick_ms: u64, grace: Duration) {
    // Players get a head start before the pursuit begins.
    sleep(grace).await;

    let mut tick_ms = initial_tick_ms;

    loop {
        sleep(Duration::from_millis(tick_ms)).await;

        let mut s = session.write().await;

        if let Some(target) = monster::select_target((s.monster.x, s.monster.y), &s.target_candidates()) {
            let (x, y) = monster::step_toward(s.world(), (s.monster.x, s.monster.y), target);
            s.monster.set_pos(x, y);
            s.broadcast(&[Event::Move {
                id: MONSTER_ID,
                x,
                y,
            }]);
        }

        tick_ms = decay_tick(tick_ms);

        let killed = s.reap();
        if !killed.is_empty() {
            debug!("tick interval now {} ms, {} kill(s)", tick_ms, killed.len());
        }

        if s.alive_players() == 0 {
            let names = s.ranked_names();
            s.broadcast(&[Event::End(names)]);
            s.close_all();
            s.finish();
            info!("all players caught, session over");
            return;
        }

        if s.connected_players() == 0 {
            s.finish();
            info!("all players disconnected, session abandoned");
            return;
        }
    }
}
