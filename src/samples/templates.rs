//! Static library of named beat, chord and melody templates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemplateKind {
    Beat,
    Chord,
    Melody,
}

/// One drum lane of a beat template: a sample query plus the steps it hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateLane {
    pub category: &'static str,
    pub subcategory: &'static str,
    /// Sixteenth-note steps within the pattern.
    pub steps: &'static [u32],
}

/// A pitched note of a chord or melody template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateNote {
    pub pitch: u8,
    pub step: u32,
    pub length_steps: u32,
    pub velocity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: TemplateKind,
    pub genre: &'static str,
    pub bpm: f64,
    pub tags: &'static [&'static str],
    pub length_steps: u32,
    pub lanes: &'static [TemplateLane],
    pub notes: &'static [TemplateNote],
}

const fn lane(subcategory: &'static str, steps: &'static [u32]) -> TemplateLane {
    TemplateLane {
        category: "drums",
        subcategory,
        steps,
    }
}

const fn n(pitch: u8, step: u32, length_steps: u32) -> TemplateNote {
    TemplateNote {
        pitch,
        step,
        length_steps,
        velocity: 100,
    }
}

static TEMPLATES: &[PatternTemplate] = &[
    PatternTemplate {
        id: "trap_basic",
        name: "Trap Beat",
        kind: TemplateKind::Beat,
        genre: "trap",
        bpm: 140.0,
        tags: &["808", "hard", "rolls"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 7, 10]),
            lane("snare", &[8]),
            lane("hihat_closed", &[0, 2, 4, 6, 8, 10, 12, 13, 14, 15]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "house_four_floor",
        name: "Four on the Floor",
        kind: TemplateKind::Beat,
        genre: "house",
        bpm: 124.0,
        tags: &["dance", "four on the floor", "club"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 4, 8, 12]),
            lane("clap", &[4, 12]),
            lane("hihat_open", &[2, 6, 10, 14]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "hiphop_boom_bap",
        name: "Boom Bap",
        kind: TemplateKind::Beat,
        genre: "hip-hop",
        bpm: 90.0,
        tags: &["boom bap", "classic", "swing"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 3, 10]),
            lane("snare", &[4, 12]),
            lane("hihat_closed", &[0, 2, 4, 6, 8, 10, 12, 14]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "techno_driving",
        name: "Driving Techno",
        kind: TemplateKind::Beat,
        genre: "techno",
        bpm: 130.0,
        tags: &["dance", "dark", "club"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 4, 8, 12]),
            lane("hihat_closed", &[2, 6, 10, 14]),
            lane("perc", &[3, 11]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "dnb_two_step",
        name: "Two-Step Break",
        kind: TemplateKind::Beat,
        genre: "drum and bass",
        bpm: 174.0,
        tags: &["breakbeat", "fast", "jungle"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 10]),
            lane("snare", &[4, 12]),
            lane("hihat_closed", &[0, 2, 4, 6, 8, 10, 12, 14]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "lofi_lazy",
        name: "Lazy Lo-fi",
        kind: TemplateKind::Beat,
        genre: "lo-fi",
        bpm: 80.0,
        tags: &["chill", "dusty", "study"],
        length_steps: 16,
        lanes: &[
            lane("kick", &[0, 9]),
            lane("snare", &[4, 12]),
            lane("hihat_closed", &[0, 4, 8, 12]),
        ],
        notes: &[],
    },
    PatternTemplate {
        id: "chords_pop_axis",
        name: "Pop Axis (I-V-vi-IV)",
        kind: TemplateKind::Chord,
        genre: "pop",
        bpm: 110.0,
        tags: &["chords", "uplifting"],
        length_steps: 64,
        notes: &[
            n(60, 0, 16), n(64, 0, 16), n(67, 0, 16),
            n(55, 16, 16), n(59, 16, 16), n(62, 16, 16),
            n(57, 32, 16), n(60, 32, 16), n(64, 32, 16),
            n(53, 48, 16), n(57, 48, 16), n(60, 48, 16),
        ],
        lanes: &[],
    },
    PatternTemplate {
        id: "chords_lofi_sevenths",
        name: "Lo-fi Sevenths",
        kind: TemplateKind::Chord,
        genre: "lo-fi",
        bpm: 80.0,
        tags: &["chords", "jazzy", "chill"],
        length_steps: 32,
        notes: &[
            n(62, 0, 16), n(65, 0, 16), n(69, 0, 16), n(72, 0, 16),
            n(55, 16, 16), n(59, 16, 16), n(62, 16, 16), n(65, 16, 16),
        ],
        lanes: &[],
    },
    PatternTemplate {
        id: "melody_minor_hook",
        name: "Minor Hook",
        kind: TemplateKind::Melody,
        genre: "trap",
        bpm: 140.0,
        tags: &["melody", "dark", "hook"],
        length_steps: 16,
        notes: &[
            n(69, 0, 2), n(72, 2, 2), n(76, 4, 4), n(74, 8, 2), n(72, 10, 2), n(69, 12, 4),
        ],
        lanes: &[],
    },
    PatternTemplate {
        id: "melody_house_stab",
        name: "House Stab",
        kind: TemplateKind::Melody,
        genre: "house",
        bpm: 124.0,
        tags: &["melody", "stab", "dance"],
        length_steps: 16,
        notes: &[n(60, 2, 1), n(63, 6, 1), n(67, 10, 1), n(65, 14, 1)],
        lanes: &[],
    },
];

/// Fold genre spellings so `Hip Hop`, `hiphop` and `hip-hop` compare equal.
fn fold_genre(genre: &str) -> String {
    let folded: String = genre
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    match folded.as_str() {
        "dnb" | "drumnbass" | "dnbass" => "drumandbass".to_string(),
        "lofi" | "lofihiphop" => "lofi".to_string(),
        "rap" => "hiphop".to_string(),
        _ => folded,
    }
}

pub fn all() -> &'static [PatternTemplate] {
    TEMPLATES
}

pub fn by_id(id: &str) -> Option<&'static PatternTemplate> {
    TEMPLATES.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

pub fn by_genre(genre: &str) -> Vec<&'static PatternTemplate> {
    let wanted = fold_genre(genre);
    TEMPLATES
        .iter()
        .filter(|t| fold_genre(t.genre) == wanted)
        .collect()
}

pub fn by_tag(tag: &str) -> Vec<&'static PatternTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| t.tags.iter().any(|x| x.eq_ignore_ascii_case(tag.trim())))
        .collect()
}

/// Templates whose tempo lies in `[min, max]`.
pub fn by_bpm_range(min: f64, max: f64) -> Vec<&'static PatternTemplate> {
    TEMPLATES
        .iter()
        .filter(|t| t.bpm >= min && t.bpm <= max)
        .collect()
}

/// The first beat template whose genre is mentioned in `text`.
pub fn beat_for_text(text: &str) -> Option<&'static PatternTemplate> {
    let haystack = fold_genre(text);
    // Earliest mention wins, so "lo-fi hip-hop" is lo-fi.
    TEMPLATES
        .iter()
        .filter(|t| t.kind == TemplateKind::Beat)
        .filter_map(|t| haystack.find(&fold_genre(t.genre)).map(|pos| (pos, t)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, t)| t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id_and_genre() {
        assert_eq!(by_id("TRAP_BASIC").unwrap().genre, "trap");
        assert!(by_id("polka").is_none());
        let hip = by_genre("Hip Hop");
        assert_eq!(hip.len(), 1);
        assert_eq!(hip[0].id, "hiphop_boom_bap");
        assert!((by_genre("dnb")[0].bpm - 174.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_by_tag_and_bpm_range() {
        assert!(by_tag("club").iter().all(|t| t.tags.contains(&"club")));
        assert_eq!(by_tag("club").len(), 2);
        let slow = by_bpm_range(70.0, 95.0);
        assert!(slow.iter().any(|t| t.id == "lofi_lazy"));
        assert!(slow.iter().all(|t| t.bpm <= 95.0));
    }

    #[test]
    fn test_beat_for_text_prefers_first_mention() {
        assert_eq!(beat_for_text("make a lo-fi hip-hop beat").unwrap().id, "lofi_lazy");
        assert_eq!(beat_for_text("give me a TRAP beat").unwrap().id, "trap_basic");
        assert_eq!(beat_for_text("some drum & bass please"), None);
        assert_eq!(beat_for_text("drum and bass please").unwrap().id, "dnb_two_step");
        assert!(beat_for_text("hello").is_none());
    }

    #[test]
    fn test_beat_lanes_fit_pattern() {
        for t in all().iter().filter(|t| t.kind == TemplateKind::Beat) {
            assert!(!t.lanes.is_empty());
            for lane in t.lanes {
                assert!(lane.steps.iter().all(|s| *s < t.length_steps), "{}", t.id);
            }
        }
    }
}
