//! Category/subcategory → concrete sample resolution.
//!
//! Matching is case-insensitive. A shorthand subcategory such as `hihat`
//! matches every concrete subcategory it prefixes or is contained in
//! (`hihat_closed`, `hihat_open`). When the category itself is not in the
//! catalog it is tried as a subcategory across all categories, so a model
//! answering `{category: "kick"}` still finds a kick.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::SampleRef;

use super::catalog::SampleLibrary;

/// Lowercase, trim, and fold separators to `_`, then apply shorthand aliases.
pub fn normalize_subcategory(raw: &str) -> String {
    let folded: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    let aliased = match folded.as_str() {
        "hat" | "hats" | "hh" | "hi_hat" | "hi_hats" | "hihats" => "hihat",
        "closed_hat" | "closed_hihat" | "chh" => "hihat_closed",
        "open_hat" | "open_hihat" | "ohh" => "hihat_open",
        "bd" | "kicks" | "kick_drum" | "bass_drum" => "kick",
        "sd" | "snares" | "snare_drum" => "snare",
        "claps" | "handclap" => "clap",
        "cymbal" | "cymbals" => "crash",
        "toms" => "tom",
        "percussion" | "percs" => "perc",
        "sub_bass" | "808" => "sub",
        _ => return folded,
    };
    aliased.to_string()
}

pub fn normalize_category(raw: &str) -> String {
    let folded = raw.trim().to_ascii_lowercase();
    match folded.as_str() {
        "drum" | "drumkit" | "drum_kit" | "kit" => "drums".to_string(),
        "synths" => "synth".to_string(),
        "key" | "piano" => "keys".to_string(),
        "vocal" | "vox" => "vocals".to_string(),
        "effects" | "sfx" => "fx".to_string(),
        _ => folded,
    }
}

/// Composite `category[/subcategory]` key shared by every reference to the
/// same sound within one batch.
pub fn composite_key(category: &str, subcategory: Option<&str>) -> String {
    let category = normalize_category(category);
    match subcategory.map(normalize_subcategory) {
        Some(sub) if !sub.is_empty() => format!("{category}/{sub}"),
        _ => category,
    }
}

fn subcategory_matches(concrete: &str, query: &str) -> bool {
    concrete == query || concrete.starts_with(query) || concrete.contains(query)
}

/// Every sample matching the query, in catalog order.
pub fn candidates<'a>(
    library: &'a SampleLibrary,
    category: &str,
    subcategory: Option<&str>,
) -> Vec<&'a SampleRef> {
    let category = normalize_category(category);
    let sub = subcategory
        .map(normalize_subcategory)
        .filter(|s| !s.is_empty());

    if library.contains_category(&category) {
        let subs: Vec<(&str, &[SampleRef])> = library.subcategories(&category).collect();
        return match sub {
            None => subs.iter().flat_map(|(_, s)| s.iter()).collect(),
            Some(q) => {
                // An exact subcategory wins over shorthand expansion.
                if let Some((_, exact)) = subs.iter().find(|(name, _)| *name == q) {
                    exact.iter().collect()
                } else {
                    subs.iter()
                        .filter(|(name, _)| subcategory_matches(name, &q))
                        .flat_map(|(_, s)| s.iter())
                        .collect()
                }
            }
        };
    }

    // Unknown category: treat it (or the subcategory, if given) as a
    // subcategory query across the whole catalog.
    let q = sub.unwrap_or_else(|| normalize_subcategory(&category));
    if q.is_empty() {
        return Vec::new();
    }
    library
        .entries()
        .filter(|(_, name, _)| subcategory_matches(name, &q))
        .flat_map(|(_, _, s)| s.iter())
        .collect()
}

/// Pick one sample for the query at random. `None` when nothing matches.
pub fn resolve<R: Rng + ?Sized>(
    library: &SampleLibrary,
    category: &str,
    subcategory: Option<&str>,
    rng: &mut R,
) -> Option<SampleRef> {
    candidates(library, category, subcategory)
        .choose(rng)
        .map(|s| (*s).clone())
}

/// Deterministic lookup by concrete sample id.
pub fn resolve_by_id(library: &SampleLibrary, id: &str) -> Option<SampleRef> {
    library.find_by_id(id).cloned()
}
