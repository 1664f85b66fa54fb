//! Cross-step reference resolution ("the pattern I just made").

use crate::commands::params::Ref;
use crate::error::AppError;
use crate::project::ProjectApi;

/// Ids minted by earlier steps of the running batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CreatedRefs {
    pattern: Option<String>,
    channel: Option<String>,
}

impl CreatedRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pattern(&mut self, id: impl Into<String>) {
        self.pattern = Some(id.into());
    }

    pub fn record_channel(&mut self, id: impl Into<String>) {
        self.channel = Some(id.into());
    }

    /// Drop the batch-local pattern if it was just deleted, so a later
    /// `LastCreated` falls through to the project.
    pub fn forget_pattern(&mut self, id: &str) {
        if self.pattern.as_deref() == Some(id) {
            self.pattern = None;
        }
    }

    pub fn forget_channel(&mut self, id: &str) {
        if self.channel.as_deref() == Some(id) {
            self.channel = None;
        }
    }

    pub fn last_pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn last_channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn resolve_pattern(
        &self,
        reference: &Ref,
        project: &dyn ProjectApi,
    ) -> Result<String, AppError> {
        match reference {
            Ref::Explicit(id) => Ok(id.clone()),
            Ref::LastCreated => self
                .pattern
                .clone()
                .or_else(|| project.latest_pattern_id())
                .ok_or_else(|| {
                    AppError::not_found("Current pattern (no pattern exists yet; add one first)")
                }),
        }
    }

    pub fn resolve_channel(
        &self,
        reference: &Ref,
        project: &dyn ProjectApi,
    ) -> Result<String, AppError> {
        match reference {
            Ref::Explicit(id) => Ok(id.clone()),
            Ref::LastCreated => self
                .channel
                .clone()
                .or_else(|| project.latest_channel_id())
                .ok_or_else(|| {
                    AppError::not_found("Current channel (no channel exists yet; add one first)")
                }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::project::InMemoryProject;

    #[test]
    fn test_batch_ref_wins_over_project() {
        let mut project = InMemoryProject::new();
        let older = project.create_pattern("Old", 16).unwrap();
        let newer = project.create_pattern("New", 16).unwrap();

        let mut refs = CreatedRefs::new();
        assert_eq!(refs.resolve_pattern(&Ref::LastCreated, &project).unwrap(), newer);

        refs.record_pattern(older.clone());
        assert_eq!(refs.resolve_pattern(&Ref::LastCreated, &project).unwrap(), older);
    }

    #[test]
    fn test_explicit_ids_pass_through() {
        let project = InMemoryProject::new();
        let refs = CreatedRefs::new();
        let id = refs
            .resolve_channel(&Ref::Explicit("ch-9".into()), &project)
            .unwrap();
        assert_eq!(id, "ch-9");
    }

    #[test]
    fn test_empty_project_is_not_found() {
        let project = InMemoryProject::new();
        let refs = CreatedRefs::new();
        let err = refs.resolve_pattern(&Ref::LastCreated, &project).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(refs.resolve_channel(&Ref::LastCreated, &project).is_err());
    }

    #[test]
    fn test_forget_only_matching_id() {
        let mut refs = CreatedRefs::new();
        refs.record_channel("ch-1");
        refs.forget_channel("ch-2");
        assert_eq!(refs.last_channel(), Some("ch-1"));
        refs.forget_channel("ch-1");
        assert_eq!(refs.last_channel(), None);
    }
}
