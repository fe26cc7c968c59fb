//! Target selection among nearby agents.

use std::sync::Arc;

use hamlet_types::agent::Position;

use crate::world::Villager;

/// Pick the candidate closest to `origin`. Ties go to the first
/// candidate encountered; an empty list yields `None`.
pub fn select_target(
    candidates: &[Arc<dyn Villager>],
    origin: Position,
) -> Option<Arc<dyn Villager>> {
    let mut best: Option<(&Arc<dyn Villager>, f64)> = None;
    for candidate in candidates {
        let distance = candidate.position().distance_sq(&origin);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(candidate, _)| Arc::clone(candidate))
}

/// Short human-readable summary of the other agents in earshot, for the
/// prompt's context block. `None` when the target is alone.
pub fn summarize_nearby(
    candidates: &[Arc<dyn Villager>],
    target: &Arc<dyn Villager>,
) -> Option<String> {
    let others: Vec<String> = candidates
        .iter()
        .filter(|c| c.id() != target.id())
        .map(|c| c.name().unwrap_or_else(|| "a villager".to_string()))
        .collect();
    match others.len() {
        0 => None,
        1 => Some(others[0].clone()),
        2 => Some(format!("{} and {}", others[0], others[1])),
        n => Some(format!("{} and {} others", others[0], n - 1)),
    }
}
