pub mod catalog;
pub mod resolver;
pub mod templates;

pub use catalog::SampleLibrary;
pub use resolver::{composite_key, resolve, resolve_by_id};
pub use templates::{PatternTemplate, TemplateKind};
