//! Same-tick placement deduplication.
//!
//! Only exact `(track, tick)` collisions count. Clips whose durations
//! overlap but whose start ticks differ are left alone.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::commands::Command;
use crate::events;
use crate::model::CONFLICT_SHIFT_TICKS;

#[derive(Debug, Default)]
pub struct TrackOccupancy {
    occupied: HashMap<usize, BTreeSet<u64>>,
}

impl TrackOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the first free tick at or after `tick` in 12-tick steps.
    pub fn claim(&mut self, track: usize, tick: u64) -> u64 {
        let taken = self.occupied.entry(track).or_default();
        let mut candidate = tick;
        while taken.contains(&candidate) {
            candidate = candidate.saturating_add(CONFLICT_SHIFT_TICKS);
        }
        taken.insert(candidate);
        candidate
    }

    /// Mark `tick` as taken without moving anything.
    pub fn reserve(&mut self, track: usize, tick: u64) {
        self.occupied.entry(track).or_default().insert(tick);
    }

    pub fn is_occupied(&self, track: usize, tick: u64) -> bool {
        self.occupied.get(&track).is_some_and(|t| t.contains(&tick))
    }
}

fn coordinates(track: i64, start: i64) -> Option<(usize, u64)> {
    Some((usize::try_from(track).ok()?, u64::try_from(start).ok()?))
}

/// Shift repeated placements. Returns how many moved.
///
/// Every authored `(track, tick)` is reserved before anything moves, so the
/// first entry at a tick keeps it and only later repeats are shifted, past
/// ticks that other entries asked for. Negative coordinates are skipped;
/// validation rejects them later.
pub fn resolve_conflicts(commands: &mut [Command], occupancy: &mut TrackOccupancy) -> usize {
    for command in commands.iter_mut() {
        if let Some((track, tick)) = command
            .placement_mut()
            .and_then(|(track, start)| coordinates(track, *start))
        {
            occupancy.reserve(track, tick);
        }
    }

    let mut first_owner: HashSet<(usize, u64)> = HashSet::new();
    let mut shifted = 0;
    for (step, command) in commands.iter_mut().enumerate() {
        let Some((track, start)) = command.placement_mut() else {
            continue;
        };
        let Some((track, tick)) = coordinates(track, *start) else {
            continue;
        };
        if first_owner.insert((track, tick)) {
            continue;
        }
        let claimed = occupancy.claim(track, tick);
        let Ok(new_start) = i64::try_from(claimed) else {
            continue;
        };
        debug!(
            event = events::PLACEMENT_SHIFTED,
            step,
            track,
            from_tick = tick,
            to_tick = claimed,
            "Shifted colliding placement"
        );
        *start = new_start;
        shifted += 1;
    }
    shifted
}
