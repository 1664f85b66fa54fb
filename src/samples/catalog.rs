use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::SampleRef;

/// Read-only catalog of `category → subcategory → samples`.
///
/// Keys are stored lowercase; insertion order is preserved so listings and
/// the context prompt are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleLibrary {
    categories: IndexMap<String, IndexMap<String, Vec<SampleRef>>>,
}

/// `(category, subcategory, id, display name)`
const BUILTIN_SAMPLES: &[(&str, &str, &str, &str)] = &[
    ("drums", "kick", "kick_808", "808 Kick"),
    ("drums", "kick", "kick_punchy", "Punchy Kick"),
    ("drums", "kick", "kick_deep", "Deep House Kick"),
    ("drums", "snare", "snare_tight", "Tight Snare"),
    ("drums", "snare", "snare_lofi", "Lo-fi Snare"),
    ("drums", "clap", "clap_classic", "Classic Clap"),
    ("drums", "clap", "clap_layered", "Layered Clap"),
    ("drums", "hihat_closed", "hh_closed_crisp", "Crisp Closed Hat"),
    ("drums", "hihat_closed", "hh_closed_808", "808 Closed Hat"),
    ("drums", "hihat_open", "hh_open_airy", "Airy Open Hat"),
    ("drums", "hihat_open", "hh_open_808", "808 Open Hat"),
    ("drums", "crash", "crash_bright", "Bright Crash"),
    ("drums", "ride", "ride_jazz", "Jazz Ride"),
    ("drums", "tom", "tom_low", "Low Tom"),
    ("drums", "tom", "tom_high", "High Tom"),
    ("drums", "perc", "perc_rim", "Rimshot"),
    ("drums", "perc", "perc_shaker", "Shaker"),
    ("bass", "sub", "bass_sub_808", "808 Sub"),
    ("bass", "sub", "bass_sub_sine", "Sine Sub"),
    ("bass", "synth", "bass_reese", "Reese Bass"),
    ("bass", "synth", "bass_acid", "Acid Bass"),
    ("synth", "lead", "lead_saw", "Saw Lead"),
    ("synth", "pad", "pad_warm", "Warm Pad"),
    ("synth", "pluck", "pluck_bell", "Bell Pluck"),
    ("keys", "piano", "piano_grand", "Grand Piano"),
    ("keys", "rhodes", "rhodes_soft", "Soft Rhodes"),
    ("fx", "riser", "fx_riser_white", "White Noise Riser"),
    ("fx", "impact", "fx_impact_boom", "Boom Impact"),
    ("vocals", "chop", "vox_chop_hey", "Hey Chop"),
];

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the app.
    pub fn builtin() -> Self {
        let mut lib = Self::new();
        for &(category, subcategory, id, name) in BUILTIN_SAMPLES {
            lib.insert(SampleRef {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                path: format!("{category}/{subcategory}/{id}.wav"),
            });
        }
        lib
    }

    pub fn insert(&mut self, mut sample: SampleRef) {
        sample.category = sample.category.to_ascii_lowercase();
        sample.subcategory = sample.subcategory.to_ascii_lowercase();
        self.categories
            .entry(sample.category.clone())
            .or_default()
            .entry(sample.subcategory.clone())
            .or_default()
            .push(sample);
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn subcategories(&self, category: &str) -> impl Iterator<Item = (&str, &[SampleRef])> {
        self.categories
            .get(&category.to_ascii_lowercase())
            .into_iter()
            .flat_map(|subs| subs.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
    }

    /// Every `(category, subcategory, samples)` triple in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &[SampleRef])> {
        self.categories.iter().flat_map(|(cat, subs)| {
            subs.iter()
                .map(move |(sub, samples)| (cat.as_str(), sub.as_str(), samples.as_slice()))
        })
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(&category.to_ascii_lowercase())
    }

    /// Deterministic lookup by sample id (case-insensitive).
    pub fn find_by_id(&self, id: &str) -> Option<&SampleRef> {
        self.entries()
            .flat_map(|(_, _, samples)| samples.iter())
            .find(|s| s.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.entries().map(|(_, _, samples)| samples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
