//! Pursuit AI for the server-controlled monster.
//!
//! Stateless per-tick functions: given the current positions and the world,
//! pick the nearest living player and step one cell toward them. Distance is
//! Manhattan, used consistently for both target selection and step choice.

use shared::world::World;

pub fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Picks the pursuit target for this tick: the candidate nearest to the
/// monster by Manhattan distance, earliest-joined winning ties. Candidates
/// are `(entity id, position)` pairs for connected, alive players.
pub fn select_target(monster: (i32, i32), candidates: &[(u32, (i32, i32))]) -> Option<(i32, i32)> {
    candidates
        .iter()
        .min_by_key(|(_, pos)| manhattan(monster, *pos))
        .map(|(_, pos)| *pos)
}

/// One pursuit step: move a single cell along the axis with the greatest
/// remaining distance (x wins ties). If that cell is inaccessible, fall back
/// to the other axis when it still closes distance; otherwise stay put.
/// Never diagonal, never out of bounds, never onto a blocked cell.
pub fn step_toward(world: &World, from: (i32, i32), target: (i32, i32)) -> (i32, i32) {
    let dx = target.0 - from.0;
    let dy = target.1 - from.1;

    let step_x = (dx != 0).then(|| (from.0 + dx.signum(), from.1));
    let step_y = (dy != 0).then(|| (from.0, from.1 + dy.signum()));

    let preferred = if dx.abs() >= dy.abs() {
        [step_x, step_y]
    } else {
        [step_y, step_x]
    };

    preferred
        .into_iter()
        .flatten()
        .find(|&(x, y)| world.is_accessible(x, y))
        .unwrap_or(from)
}
