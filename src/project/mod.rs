pub mod api;
pub mod history;
pub mod memory;

pub use api::{ChannelSummary, PatternSummary, ProjectApi, ProjectSummary};
pub use history::{UndoHistory, UndoState};
pub use memory::{InMemoryProject, ProjectState};
