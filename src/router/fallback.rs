//! Network-independent responder used when the model cannot be reached.
//!
//! A handful of keyword rules cover the most common requests: genre beats,
//! tempo changes, new patterns, the metronome and transport control.
//! Anything else turns into a clarification question so the caller always
//! gets a structured plan back.

use serde_json::json;

use crate::executor::{BatchPlan, PlanSource, RawAction};
use crate::model::TICKS_PER_STEP;
use crate::samples::templates::{self, PatternTemplate};

const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Lowercased words with surrounding punctuation trimmed.
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '.')
                .trim_end_matches('.')
                .to_ascii_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_any(words: &[String], needles: &[&str]) -> bool {
    words.iter().any(|w| needles.contains(&w.as_str()))
}

/// A number following (or preceding) a tempo keyword: "tempo 90", "90 bpm".
fn tempo_value(words: &[String]) -> Option<f64> {
    let keyword = words
        .iter()
        .position(|w| matches!(w.as_str(), "tempo" | "speed") || w.ends_with("bpm"))?;
    let number = |w: &String| w.trim_end_matches("bpm").parse::<f64>().ok();
    words
        .iter()
        .skip(keyword)
        .find_map(number)
        .or_else(|| words.iter().take(keyword).rev().find_map(number))
}

/// Text after "called" / "named", cut at the next "and".
fn pattern_name(text: &str) -> Option<String> {
    let raw: Vec<&str> = text.split_whitespace().collect();
    let at = raw
        .iter()
        .position(|w| w.eq_ignore_ascii_case("called") || w.eq_ignore_ascii_case("named"))?;
    let name: Vec<&str> = raw
        .iter()
        .skip(at + 1)
        .take_while(|w| !w.eq_ignore_ascii_case("and"))
        .copied()
        .collect();
    let name = name
        .join(" ")
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == ',')
        .to_string();
    Some(name).filter(|n| !n.is_empty())
}

/// `setBpm` plus one `addSample` per lane hit, each lane on its own track.
fn beat_actions(template: &PatternTemplate) -> Vec<RawAction> {
    let mut actions = vec![RawAction::new("setBpm", json!({ "bpm": template.bpm }))];
    for (track, lane) in template.lanes.iter().enumerate() {
        for step in lane.steps {
            actions.push(RawAction::new(
                "addSample",
                json!({
                    "category": lane.category,
                    "subcategory": lane.subcategory,
                    "trackIndex": track,
                    "startTick": u64::from(*step) * TICKS_PER_STEP,
                    "duration": TICKS_PER_STEP,
                }),
            ));
        }
    }
    actions
}

fn clarification() -> RawAction {
    RawAction::new(
        "clarificationNeeded",
        json!({
            "question": "The assistant is offline. What would you like to do?",
            "options": ["Set the tempo", "Make a beat", "Create a pattern", "Play", "Stop"],
        }),
    )
}

/// Build a plan for `utterance` from the fixed rule set.
pub fn respond(utterance: &str) -> BatchPlan {
    let w = words(utterance);
    let mut actions = Vec::new();
    let mut matched = Vec::new();

    let template = templates::beat_for_text(utterance);
    if let Some(t) = template {
        actions.extend(beat_actions(t));
        matched.push(format!("{} beat", t.genre));
    }

    if let Some(bpm) = tempo_value(&w) {
        // An explicit tempo overrides the template's.
        actions.retain(|a| a.action != "setBpm");
        actions.insert(0, RawAction::new("setBpm", json!({ "bpm": bpm })));
        matched.push("tempo".to_string());
    }

    let wants_pattern = has_any(&w, &["pattern", "loop"])
        && has_any(&w, &["new", "create", "add", "make", "start"]);
    if wants_pattern {
        let name = pattern_name(utterance).unwrap_or_else(|| "Pattern".to_string());
        actions.push(RawAction::new("addPattern", json!({ "name": name })));
        matched.push("pattern".to_string());
    }

    let metronome = has_any(&w, &["metronome", "click"]);
    if metronome {
        let enabled = if has_any(&w, &["off", "disable", "mute", "stop"]) {
            Some(false)
        } else if has_any(&w, &["on", "enable", "start"]) {
            Some(true)
        } else {
            None
        };
        actions.push(RawAction::new("toggleMetronome", json!({ "enabled": enabled })));
        matched.push("metronome".to_string());
    }

    // Transport goes last so a fresh beat is in place before it plays.
    let transport = if metronome || wants_pattern {
        has_any(&w, &["play", "playback"]).then_some("play")
    } else if has_any(&w, &["stop", "halt"]) {
        Some("stop")
    } else if has_any(&w, &["pause"]) {
        Some("pause")
    } else if has_any(&w, &["play", "start", "resume"]) {
        Some("play")
    } else {
        None
    };
    if let Some(action) = transport {
        actions.push(RawAction::new(action, json!({})));
        matched.push(action.to_string());
    }

    if actions.is_empty() {
        return BatchPlan::new(vec![clarification()])
            .with_source(PlanSource::Fallback)
            .with_reasoning("Offline fallback: no rule matched");
    }

    let mut plan = BatchPlan::new(actions)
        .with_source(PlanSource::Fallback)
        .with_reasoning(format!("Offline fallback: {}", matched.join(", ")));
    plan.confidence = Some(FALLBACK_CONFIDENCE);
    plan
}
