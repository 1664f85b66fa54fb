use serde::{Deserialize, Serialize};

/// A concrete audio asset drawn from the sample catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRef {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    /// Asset path relative to the sample root.
    pub path: String,
}

impl SampleRef {
    /// Composite `category/subcategory` key of this sample.
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.subcategory)
    }
}
