//! Model router: utterance + context prompt → [`BatchPlan`].
//!
//! Per call: reuse or create the tier's session for the current prompt hash,
//! send the utterance with bounded linear-backoff retries, and decode the
//! reply. Auth and quota failures are returned immediately. Any other
//! exhausted failure degrades to the local fallback responder, so the caller
//! always receives a plan.

pub mod backend;
pub mod cache;
pub mod context;
pub mod fallback;
pub mod response;
pub mod session;

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::events;
use crate::executor::{BatchPlan, PlanSource};
use crate::settings::{ModelTier, RouterSettings};

pub use backend::{BackendError, HttpBackend, ModelBackend, SessionHandles};
pub use cache::ResponseCache;
pub use context::build_context_prompt;
pub use session::{context_hash, ModelSession, SessionCache};

pub struct ModelRouter {
    backend: Box<dyn ModelBackend>,
    settings: RouterSettings,
    cache: Mutex<ResponseCache>,
}

impl ModelRouter {
    pub fn new(backend: impl ModelBackend + 'static, settings: RouterSettings) -> Self {
        let cache = Mutex::new(ResponseCache::new(settings.response_cache_size));
        Self {
            backend: Box::new(backend),
            settings,
            cache,
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    pub async fn send(
        &self,
        sessions: &mut SessionCache,
        utterance: &str,
        tier: ModelTier,
        context_prompt: &str,
    ) -> Result<BatchPlan, AppError> {
        let hash = context_hash(context_prompt);

        let cached = self.cache.lock().get(tier, &hash, utterance).cloned();
        if let Some(plan) = cached {
            debug!(event = events::CACHE_HIT, tier = ?tier, "Serving plan from response cache");
            return Ok(plan.with_source(PlanSource::Cache));
        }

        let attempts = self.settings.max_retries.saturating_add(1);
        let mut last_error = None;
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = Duration::from_millis(
                    self.settings.base_delay_ms.saturating_mul(u64::from(attempt)),
                );
                info!(
                    event = events::RETRY_SCHEDULED,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %last_error.as_ref().map(ToString::to_string).unwrap_or_default(),
                    "Retrying model call"
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(sessions, utterance, tier, context_prompt, &hash).await {
                Ok(raw) => {
                    let reply = response::decode_reply(&raw);
                    let plan = reply.plan.with_source(PlanSource::Model);
                    if !reply.parsed {
                        warn!(
                            event = events::RESPONSE_UNPARSEABLE,
                            tier = ?tier,
                            "Model reply could not be decoded"
                        );
                    } else {
                        self.cache.lock().insert(tier, &hash, utterance, plan.clone());
                    }
                    return Ok(plan);
                }
                Err(e) if e.is_terminal() => return Err(e.into()),
                Err(BackendError::SessionExpired(reason)) => {
                    sessions.invalidate(tier, &reason);
                    last_error = Some(BackendError::SessionExpired(reason));
                }
                Err(e) => last_error = Some(e),
            }
        }

        warn!(
            event = events::FALLBACK_ENGAGED,
            tier = ?tier,
            attempts,
            error = %last_error.map(|e| e.to_string()).unwrap_or_default(),
            "Model unavailable; using offline fallback"
        );
        Ok(fallback::respond(utterance))
    }

    async fn attempt(
        &self,
        sessions: &mut SessionCache,
        utterance: &str,
        tier: ModelTier,
        context_prompt: &str,
        hash: &str,
    ) -> Result<String, BackendError> {
        if sessions.current(tier, hash).is_none() {
            let handles = self.backend.create_session(tier, context_prompt).await?;
            sessions.insert(ModelSession {
                tier,
                assistant_handle: handles.assistant_handle,
                thread_handle: handles.thread_handle,
                context_hash: hash.to_string(),
                system_prompt: context_prompt.to_string(),
            });
        }
        let session = sessions
            .get(tier)
            .ok_or_else(|| BackendError::SessionExpired("session missing".to_string()))?;
        self.backend.send(session, utterance).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    /// Replays a fixed script of replies; `Ok` once the script runs out.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        sessions_created: AtomicUsize,
        sends: AtomicUsize,
    }

    struct ScriptedBackend(Arc<Scripted>);

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn create_session(
            &self,
            _tier: ModelTier,
            _system_prompt: &str,
        ) -> Result<SessionHandles, BackendError> {
            let n = self.0.sessions_created.fetch_add(1, Ordering::SeqCst);
            Ok(SessionHandles {
                assistant_handle: "asst".into(),
                thread_handle: format!("thread-{n}"),
            })
        }

        async fn send(&self, _session: &ModelSession, _utterance: &str) -> Result<String, BackendError> {
            self.0.sends.fetch_add(1, Ordering::SeqCst);
            self.0
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(r#"{"actions": [{"action": "play"}]}"#.to_string()))
        }
    }

    fn scripted_router(script: Vec<Result<String, BackendError>>) -> (ModelRouter, Arc<Scripted>) {
        let state = Arc::new(Scripted {
            replies: Mutex::new(script.into()),
            ..Scripted::default()
        });
        let settings = RouterSettings {
            base_delay_ms: 0,
            ..RouterSettings::default()
        };
        (ModelRouter::new(ScriptedBackend(Arc::clone(&state)), settings), state)
    }

    fn transport() -> Result<String, BackendError> {
        Err(BackendError::Transport("connection reset".into()))
    }

    #[tokio::test]
    async fn test_successful_reply_is_decoded() {
        let (router, state) = scripted_router(vec![Ok(
            "```json\n{\"actions\": [{\"action\": \"setBpm\", \"parameters\": {\"bpm\": 90}}]}\n```".into(),
        )]);
        let mut sessions = SessionCache::new();
        let plan = router
            .send(&mut sessions, "slow it down", ModelTier::Standard, "ctx")
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Model);
        assert_eq!(plan.actions[0].action, "setBpm");
        assert_eq!(state.sessions_created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_three_failures_fall_back() {
        let (router, state) = scripted_router(vec![transport(), transport(), transport()]);
        let mut sessions = SessionCache::new();
        let plan = router
            .send(&mut sessions, "set tempo to 100", ModelTier::Standard, "ctx")
            .await
            .unwrap();
        assert_eq!(state.sends.load(Ordering::SeqCst), 3);
        assert_eq!(plan.source, PlanSource::Fallback);
        assert_eq!(plan.actions[0].action, "setBpm");
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let (router, state) = scripted_router(vec![transport()]);
        let mut sessions = SessionCache::new();
        let plan = router
            .send(&mut sessions, "play", ModelTier::Standard, "ctx")
            .await
            .unwrap();
        assert_eq!(plan.source, PlanSource::Model);
        assert_eq!(state.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_terminal_error_is_not_retried() {
        let (router, state) = scripted_router(vec![Err(BackendError::Unauthorized("bad key".into()))]);
        let mut sessions = SessionCache::new();
        let err = router
            .send(&mut sessions, "play", ModelTier::Standard, "ctx")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
        assert_eq!(state.sends.load(Ordering::SeqCst), 1);

        let (router, _) = scripted_router(vec![Err(BackendError::RateLimited("quota".into()))]);
        let err = router
            .send(&mut SessionCache::new(), "play", ModelTier::Standard, "ctx")
            .await
            .unwrap_err();
        assert!(err.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let (router, state) = scripted_router(vec![transport(), transport(), transport(), transport()]);
        let mut sessions = SessionCache::new();
        let settings = RouterSettings {
            base_delay_ms: 1000,
            max_retries: 3,
            ..RouterSettings::default()
        };
        let router = ModelRouter { settings, ..router };

        let started = tokio::time::Instant::now();
        let plan = router
            .send(&mut sessions, "stop", ModelTier::Standard, "ctx")
            .await
            .unwrap();
        // 1x, 2x, 3x the base delay; a doubling schedule would take 7s.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000 + 2000 + 3000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(6500), "{elapsed:?}");
        assert_eq!(plan.source, PlanSource::Fallback);
        assert_eq!(state.sends.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let (router, state) = scripted_router(Vec::new());
        let mut sessions = SessionCache::new();
        router.send(&mut sessions, "Play it", ModelTier::Fast, "ctx").await.unwrap();
        let plan = router.send(&mut sessions, "play  it", ModelTier::Fast, "ctx").await.unwrap();
        assert_eq!(plan.source, PlanSource::Cache);
        assert_eq!(state.sends.load(Ordering::SeqCst), 1);

        // A different context is a different request.
        router.send(&mut sessions, "play it", ModelTier::Fast, "ctx2").await.unwrap();
        assert_eq!(state.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_plans_are_not_cached() {
        let (router, state) = scripted_router(vec![transport(), transport(), transport()]);
        let mut sessions = SessionCache::new();
        let first = router.send(&mut sessions, "stop", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(first.source, PlanSource::Fallback);
        let second = router.send(&mut sessions, "stop", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(second.source, PlanSource::Model);
        assert_eq!(state.sends.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_context_change_recreates_session() {
        let (router, state) = scripted_router(Vec::new());
        let mut sessions = SessionCache::new();
        router.send(&mut sessions, "a", ModelTier::Standard, "v1").await.unwrap();
        router.send(&mut sessions, "b", ModelTier::Standard, "v1").await.unwrap();
        assert_eq!(state.sessions_created.load(Ordering::SeqCst), 1);
        router.send(&mut sessions, "c", ModelTier::Standard, "v2").await.unwrap();
        assert_eq!(state.sessions_created.load(Ordering::SeqCst), 2);
        assert_eq!(
            sessions.get(ModelTier::Standard).unwrap().context_hash,
            context_hash("v2")
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_recreated() {
        let (router, state) = scripted_router(vec![Err(BackendError::SessionExpired("thread gone".into()))]);
        let mut sessions = SessionCache::new();
        let plan = router.send(&mut sessions, "play", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(plan.source, PlanSource::Model);
        assert_eq!(state.sessions_created.load(Ordering::SeqCst), 2);
        assert_eq!(sessions.get(ModelTier::Standard).unwrap().thread_handle, "thread-1");
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_unknown_and_uncached() {
        let (router, state) = scripted_router(vec![Ok("no idea".into())]);
        let mut sessions = SessionCache::new();
        let plan = router.send(&mut sessions, "hmm", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(plan.actions[0].action, "unknown");
        assert_eq!(plan.actions[0].parameters["originalText"], "no idea");
        router.send(&mut sessions, "hmm", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(state.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_model_authored_unknown_is_cached() {
        let reply = r#"{"actions": [{"action": "unknown", "parameters": {"reason": "not music"}}]}"#;
        let (router, state) = scripted_router(vec![Ok(reply.into())]);
        let mut sessions = SessionCache::new();
        router.send(&mut sessions, "bake bread", ModelTier::Standard, "ctx").await.unwrap();
        let plan = router.send(&mut sessions, "bake bread", ModelTier::Standard, "ctx").await.unwrap();
        assert_eq!(plan.source, PlanSource::Cache);
        assert_eq!(plan.actions[0].parameters["reason"], "not music");
        assert_eq!(state.sends.load(Ordering::SeqCst), 1);
    }
}
