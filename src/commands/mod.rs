pub mod catalog;
pub mod command;
pub mod handlers;
pub mod params;
pub mod parser;
pub mod validation;

pub use catalog::{command_registry, prompt_reference, CommandRegistryEntry};
pub use command::{canonical_action, Command, CommandFamily, CommandInfo, CommandOutput};
pub use handlers::StepContext;
pub use params::{Ref, SampleSpec};
pub use parser::{parse, parse_all};
