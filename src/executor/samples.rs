//! Batch-wide sample consistency.
//!
//! Every reference to the same `category[/subcategory]` key within one batch
//! is pinned to a single concrete sample id. Once bound a key never changes
//! for the rest of the batch.

use indexmap::IndexMap;
use rand::Rng;
use tracing::debug;

use crate::commands::Command;
use crate::events;
use crate::samples::{composite_key, resolve, resolve_by_id, SampleLibrary};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleChoiceTable {
    choices: IndexMap<String, String>,
}

impl SampleChoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from choices carried over from an earlier batch. Keys are
    /// re-normalized so `Drums/HiHat` and `drums/hihat` land on one entry.
    pub fn seeded(previous: &IndexMap<String, String>) -> Self {
        let mut table = Self::new();
        for (key, id) in previous {
            let (category, sub) = match key.split_once('/') {
                Some((c, s)) => (c, Some(s)),
                None => (key.as_str(), None),
            };
            table
                .choices
                .entry(composite_key(category, sub))
                .or_insert_with(|| id.clone());
        }
        table
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.choices.get(key).map(String::as_str)
    }

    /// The sample bound to the query, binding one on first use. A seeded id
    /// that no longer exists in the library is ignored rather than trusted.
    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        library: &SampleLibrary,
        category: &str,
        subcategory: Option<&str>,
        rng: &mut R,
    ) -> Option<String> {
        let key = composite_key(category, subcategory);
        if let Some(id) = self.choices.get(&key) {
            if resolve_by_id(library, id).is_some() {
                return Some(id.clone());
            }
        }
        let sample = resolve(library, category, subcategory, rng)?;
        self.choices.insert(key, sample.id.clone());
        Some(sample.id)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn into_map(self) -> IndexMap<String, String> {
        self.choices
    }
}

/// Pin every sample query in `commands` that lacks an explicit id.
///
/// Unresolvable queries are left untouched; the step then fails with
/// `SampleNotFound` when it runs.
pub fn bind_samples<R: Rng + ?Sized>(
    commands: &mut [Command],
    table: &mut SampleChoiceTable,
    library: &SampleLibrary,
    rng: &mut R,
) {
    for command in commands.iter_mut() {
        let Some(spec) = command.sample_spec_mut() else {
            continue;
        };
        if spec.sample_id.is_some() || spec.is_empty() {
            continue;
        }
        // A bare subcategory ("kick") is itself the query.
        let (category, sub) = match (spec.category.as_deref(), spec.subcategory.as_deref()) {
            (Some(c), s) => (c.to_string(), s.map(str::to_string)),
            (None, Some(s)) => (s.to_string(), None),
            (None, None) => continue,
        };
        match table.choose(library, &category, sub.as_deref(), rng) {
            Some(id) => spec.sample_id = Some(id),
            None => debug!(
                event = events::SAMPLE_UNRESOLVED,
                query = %spec.describe(),
                "No sample matches query"
            ),
        }
    }
}
