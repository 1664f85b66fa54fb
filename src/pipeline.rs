//! Entry point for a request handler: utterance in, [`BatchResult`] out.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::AppError;
use crate::executor::{BatchExecutor, BatchPlan, BatchResult};
use crate::project::ProjectApi;
use crate::router::{build_context_prompt, HttpBackend, ModelRouter, SessionCache};
use crate::samples::SampleLibrary;
use crate::settings::{AppSettings, ExecutorSettings, ModelTier};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub plan: BatchPlan,
    pub result: BatchResult,
}

pub struct Pipeline {
    router: ModelRouter,
    library: SampleLibrary,
    executor: ExecutorSettings,
    config_dir: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(router: ModelRouter, library: SampleLibrary, executor: ExecutorSettings) -> Self {
        Self {
            router,
            library,
            executor,
            config_dir: None,
        }
    }

    /// Build the HTTP-backed pipeline from persisted settings. Step audit
    /// logs go under `config_dir` when enabled.
    pub fn from_settings(config_dir: &Path, settings: &AppSettings) -> Result<Self, AppError> {
        let backend = HttpBackend::new(settings.llm.clone())?;
        let router = ModelRouter::new(backend, settings.router.clone());
        let mut pipeline = Self::new(router, SampleLibrary::builtin(), settings.executor.clone());
        pipeline.config_dir = Some(config_dir.to_path_buf());
        Ok(pipeline)
    }

    pub fn library(&self) -> &SampleLibrary {
        &self.library
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    /// Plan `utterance` against the current project and execute the plan.
    ///
    /// `previous_choices` is the `sampleChoices` of an earlier result; passing
    /// it back keeps the same sounds across follow-up requests. Only auth and
    /// quota failures return `Err`.
    pub async fn handle(
        &self,
        sessions: &mut SessionCache,
        project: &mut dyn ProjectApi,
        utterance: &str,
        tier: ModelTier,
        previous_choices: Option<&IndexMap<String, String>>,
    ) -> Result<PipelineOutcome, AppError> {
        let context_prompt = build_context_prompt(&project.summary(), &self.library);
        let mut plan = self
            .router
            .send(sessions, utterance, tier, &context_prompt)
            .await?;
        if let Some(previous) = previous_choices {
            for (key, id) in previous {
                plan.sample_choices
                    .entry(key.clone())
                    .or_insert_with(|| id.clone());
            }
        }
        let result = self.execute(&plan, project);
        Ok(PipelineOutcome { plan, result })
    }

    /// Execute an already-built plan (e.g. one replayed by the caller).
    pub fn execute(&self, plan: &BatchPlan, project: &mut dyn ProjectApi) -> BatchResult {
        let executor = BatchExecutor::new(&self.library, self.executor.clone());
        match &self.config_dir {
            Some(dir) => executor.with_audit_dir(dir).execute(plan, project),
            None => executor.execute(plan, project),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::executor::PlanSource;
    use crate::project::InMemoryProject;
    use crate::router::{BackendError, ModelBackend, ModelSession, SessionHandles};
    use crate::settings::RouterSettings;

    /// Always down: forces the offline fallback.
    struct Offline;

    #[async_trait]
    impl ModelBackend for Offline {
        async fn create_session(
            &self,
            _tier: ModelTier,
            _prompt: &str,
        ) -> Result<SessionHandles, BackendError> {
            Err(BackendError::Transport("offline".into()))
        }

        async fn send(&self, _s: &ModelSession, _u: &str) -> Result<String, BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
    }

    /// Echoes a fixed two-step plan that relies on "current".
    struct Canned;

    #[async_trait]
    impl ModelBackend for Canned {
        async fn create_session(
            &self,
            _tier: ModelTier,
            _prompt: &str,
        ) -> Result<SessionHandles, BackendError> {
            Ok(SessionHandles {
                assistant_handle: "a".into(),
                thread_handle: "t".into(),
            })
        }

        async fn send(&self, _s: &ModelSession, _u: &str) -> Result<String, BackendError> {
            Ok(r#"{"actions": [
                {"action": "createPattern", "parameters": {"name": "Test"}},
                {"action": "addNote", "parameters": {"patternId": "current", "pitch": "60", "startTick": 0, "duration": 96}}
            ], "confidence": 0.9}"#
                .to_string())
        }
    }

    fn pipeline(backend: impl ModelBackend + 'static) -> Pipeline {
        let router = ModelRouter::new(
            backend,
            RouterSettings {
                base_delay_ms: 0,
                ..RouterSettings::default()
            },
        );
        let settings = ExecutorSettings {
            audit: false,
            rng_seed: Some(5),
            ..ExecutorSettings::default()
        };
        Pipeline::new(router, SampleLibrary::builtin(), settings)
    }

    #[tokio::test]
    async fn test_model_plan_executes_end_to_end() {
        let pipeline = pipeline(Canned);
        let mut project = InMemoryProject::new();
        let outcome = pipeline
            .handle(&mut SessionCache::new(), &mut project, "hook", ModelTier::Standard, None)
            .await
            .unwrap();
        assert_eq!(outcome.plan.source, PlanSource::Model);
        assert_eq!(outcome.result.success_count, 2);
        assert_eq!(project.state().patterns[0].notes.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_genre_request_still_builds_a_beat() {
        let pipeline = pipeline(Offline);
        let mut project = InMemoryProject::new();
        let outcome = pipeline
            .handle(
                &mut SessionCache::new(),
                &mut project,
                "make a house beat",
                ModelTier::Standard,
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome.plan.source, PlanSource::Fallback);
        assert!(outcome.result.success, "{}", outcome.result.message);
        assert!((project.state().transport.bpm - 124.0).abs() < f64::EPSILON);
        assert!(!project.state().clips.is_empty());
        assert!(outcome.result.sample_choices.contains_key("drums/kick"));
    }

    #[tokio::test]
    async fn test_previous_choices_are_honoured() {
        let pipeline = pipeline(Offline);
        let mut project = InMemoryProject::new();
        let mut previous = IndexMap::new();
        previous.insert("drums/kick".to_string(), "kick_deep".to_string());
        let outcome = pipeline
            .handle(
                &mut SessionCache::new(),
                &mut project,
                "techno beat",
                ModelTier::Fast,
                Some(&previous),
            )
            .await
            .unwrap();
        assert_eq!(outcome.result.sample_choices["drums/kick"], "kick_deep");
    }
}
