use serde::{Deserialize, Serialize};

/// A MIDI-style note inside a pattern. Ticks are relative to the pattern start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub duration: u64,
}

/// Validated note data handed to the project when inserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteInput {
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub duration: u64,
}

/// Partial note edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub pitch: Option<u8>,
    pub velocity: Option<u8>,
    pub start_tick: Option<u64>,
    pub duration: Option<u64>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.pitch.is_none()
            && self.velocity.is_none()
            && self.start_tick.is_none()
            && self.duration.is_none()
    }

    pub fn apply(&self, note: &mut Note) {
        if let Some(p) = self.pitch {
            note.pitch = p;
        }
        if let Some(v) = self.velocity {
            note.velocity = v;
        }
        if let Some(t) = self.start_tick {
            note.start_tick = t;
        }
        if let Some(d) = self.duration {
            note.duration = d;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    /// Length in sixteenth-note steps.
    pub length_steps: u32,
    /// Notes kept sorted by start tick.
    pub notes: Vec<Note>,
}

impl Pattern {
    /// Insert a note keeping `notes` ordered by start tick.
    pub fn insert_note(&mut self, note: Note) {
        let pos = self
            .notes
            .partition_point(|n| n.start_tick <= note.start_tick);
        self.notes.insert(pos, note);
    }

    pub fn note_mut(&mut self, note_id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == note_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, start: u64) -> Note {
        Note {
            id: id.into(),
            pitch: 60,
            velocity: 100,
            start_tick: start,
            duration: 24,
        }
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut p = Pattern {
            id: "p1".into(),
            name: "Test".into(),
            length_steps: 16,
            notes: Vec::new(),
        };
        p.insert_note(note("a", 96));
        p.insert_note(note("b", 0));
        p.insert_note(note("c", 48));
        let ids: Vec<&str> = p.notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_note_update_applies_only_set_fields() {
        let mut n = note("a", 0);
        let update = NoteUpdate {
            velocity: Some(64),
            ..NoteUpdate::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut n);
        assert_eq!(n.velocity, 64);
        assert_eq!(n.pitch, 60);
        assert!(NoteUpdate::default().is_empty());
    }
}
