//! Step handlers, one module per command family.
//!
//! Every handler runs all of its validators before the first mutation call,
//! so a rejected step never leaves a partial change behind.

pub mod channel;
pub mod effect;
pub mod meta;
pub mod mixer;
pub mod note;
pub mod pattern;
pub mod playlist;
pub mod transport;

use crate::commands::params::{Ref, SampleSpec};
use crate::error::AppError;
use crate::executor::refs::CreatedRefs;
use crate::model::SampleRef;
use crate::project::ProjectApi;
use crate::samples::{resolve_by_id, SampleLibrary};

/// Everything a step may touch. Built by the batch executor for each step;
/// the project is passed in explicitly, never fetched from a global.
pub struct StepContext<'a> {
    pub project: &'a mut dyn ProjectApi,
    pub library: &'a SampleLibrary,
    pub refs: &'a mut CreatedRefs,
}

impl StepContext<'_> {
    pub fn pattern_id(&self, pattern: &Ref) -> Result<String, AppError> {
        self.refs.resolve_pattern(pattern, &*self.project)
    }

    pub fn channel_id(&self, channel: &Ref) -> Result<String, AppError> {
        self.refs.resolve_channel(channel, &*self.project)
    }

    /// The concrete sample bound to `spec`. By the time a step runs the
    /// executor has pinned every resolvable query to a sample id.
    pub fn sample(&self, spec: &SampleSpec) -> Result<SampleRef, AppError> {
        spec.sample_id
            .as_deref()
            .and_then(|id| resolve_by_id(self.library, id))
            .ok_or_else(|| AppError::SampleNotFound {
                query: spec.describe(),
            })
    }
}
