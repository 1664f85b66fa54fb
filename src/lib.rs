//! Natural-language command pipeline for the VibeBeats sequencer.
//!
//! A request handler builds a [`pipeline::Pipeline`], hands it the user's
//! utterance and the live project, and gets back a [`executor::BatchResult`].

pub mod audit;
pub mod commands;
pub mod error;
pub mod events;
pub mod executor;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod project;
pub mod router;
pub mod samples;
pub mod settings;
pub mod storage;

pub use error::AppError;
pub use executor::{BatchExecutor, BatchPlan, BatchResult, ExecutionResult};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use project::{InMemoryProject, ProjectApi};
pub use router::{ModelRouter, SessionCache};
pub use settings::{AppSettings, ModelTier};
