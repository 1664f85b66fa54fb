//! Tick arithmetic. One quarter-note beat is [`PPQ`] ticks.

/// Pulses (ticks) per quarter note.
pub const PPQ: u64 = 96;

/// One sixteenth note: the step size of patterns and beat templates.
pub const TICKS_PER_STEP: u64 = PPQ / 4;

/// One thirty-second note: the increment used to move a placement off an
/// occupied tick.
pub const CONFLICT_SHIFT_TICKS: u64 = PPQ / 8;

pub fn steps_to_ticks(steps: u64) -> u64 {
    steps * TICKS_PER_STEP
}

pub fn beats_to_ticks(beats: u64) -> u64 {
    beats * PPQ
}

/// Convert a tick position to `bar.beat.tick` (1-based bar and beat), assuming 4/4.
pub fn format_position(tick: u64) -> String {
    let beat_index = tick / PPQ;
    let bar = beat_index / 4 + 1;
    let beat = beat_index % 4 + 1;
    let rem = tick % PPQ;
    format!("{bar}.{beat}.{rem:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_constants() {
        assert_eq!(TICKS_PER_STEP, 24);
        assert_eq!(CONFLICT_SHIFT_TICKS, 12);
        assert_eq!(steps_to_ticks(16), 384);
        assert_eq!(beats_to_ticks(4), 384);
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0), "1.1.00");
        assert_eq!(format_position(96), "1.2.00");
        assert_eq!(format_position(384 + 48), "2.1.48");
    }
}
