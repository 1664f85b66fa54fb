//! System prompt assembly.
//!
//! The prompt must be a pure function of its inputs: the router hashes it to
//! decide whether the upstream session is still valid.

use crate::commands::prompt_reference;
use crate::model::time::format_position;
use crate::model::PPQ;
use crate::project::ProjectSummary;
use crate::samples::templates::{self, TemplateKind};
use crate::samples::SampleLibrary;

const RESPONSE_FORMAT: &str = r#"Respond with ONLY a JSON object, no prose and no code fences:
{
  "actions": [ { "action": "<actionName>", "parameters": { ... } } ],
  "confidence": <0.0-1.0>,
  "reasoning": "<one short sentence>"
}
Use "current" as patternId/channelId to refer to the pattern or channel created earlier in the same response (or the most recent one in the project).
If the request is ambiguous, return a single clarificationNeeded action."#;

pub fn build_context_prompt(summary: &ProjectSummary, library: &SampleLibrary) -> String {
    let mut lines = Vec::new();
    lines.push(
        "You are the production assistant inside VibeBeats, a pattern-based music sequencer."
            .to_string(),
    );
    lines.push("Translate the user's request into sequencer actions.".to_string());
    lines.push(String::new());

    // Current state summary
    lines.push(format!(
        "Transport: {} at {}, {} BPM",
        if summary.playing { "playing" } else { "stopped" },
        format_position(summary.position_tick),
        summary.bpm
    ));
    lines.push(format!("Patterns: {}", summary.patterns.len()));
    for p in &summary.patterns {
        lines.push(format!("  - \"{}\" (id: {}, {} notes)", p.name, p.id, p.note_count));
    }
    lines.push(format!("Channels: {}", summary.channels.len()));
    for c in &summary.channels {
        lines.push(format!(
            "  - \"{}\" (id: {}, sample: {})",
            c.name,
            c.id,
            c.sample.as_deref().unwrap_or("none")
        ));
    }
    lines.push(format!(
        "Playlist tracks: {} (0-based; missing tracks are created automatically), clips: {}",
        summary.playlist_tracks, summary.clips
    ));
    lines.push(format!("Mixer tracks: {}", summary.mixer_tracks));

    lines.push(format!(
        "\nTiming: {PPQ} ticks per beat, 4 beats per bar. A sixteenth note is {} ticks.",
        PPQ / 4
    ));

    lines.push("\nSample categories (category: subcategories):".to_string());
    for category in library.categories() {
        let subs: Vec<&str> = library.subcategories(category).map(|(s, _)| s).collect();
        lines.push(format!("  {category}: {}", subs.join(", ")));
    }

    lines.push("\nBeat templates (genre @ bpm):".to_string());
    let beats: Vec<String> = templates::all()
        .iter()
        .filter(|t| t.kind == TemplateKind::Beat)
        .map(|t| format!("{} @ {}", t.genre, t.bpm))
        .collect();
    lines.push(format!("  {}", beats.join(", ")));

    lines.push("\n## Actions (* = required)".to_string());
    lines.push(prompt_reference());

    lines.push(RESPONSE_FORMAT.to_string());
    lines.join("\n")
}
