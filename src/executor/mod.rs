//! The batch executor: turns a [`BatchPlan`] into project mutations.
//!
//! Stages run in a fixed order over the whole plan before any step executes:
//! parse every entry, pin sample queries to concrete ids, provision playlist
//! tracks, then shift same-tick placements. Steps then run one at a time in
//! plan order, each isolated from the failures (and panics) of the others.

pub mod conflicts;
pub mod plan;
pub mod refs;
pub mod result;
pub mod samples;
pub mod tracks;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::audit;
use crate::commands::{parse_all, Command, StepContext};
use crate::error::AppError;
use crate::events;
use crate::project::ProjectApi;
use crate::samples::SampleLibrary;
use crate::settings::ExecutorSettings;

pub use conflicts::TrackOccupancy;
pub use plan::{BatchPlan, PlanSource, RawAction};
pub use refs::CreatedRefs;
pub use result::{BatchResult, ExecutionResult};
pub use samples::SampleChoiceTable;

pub struct BatchExecutor<'a> {
    library: &'a SampleLibrary,
    settings: ExecutorSettings,
    audit_dir: Option<PathBuf>,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(library: &'a SampleLibrary, settings: ExecutorSettings) -> Self {
        Self {
            library,
            settings,
            audit_dir: None,
        }
    }

    /// Write step audit lines under `dir` (when `settings.audit` is on).
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    /// Execute `plan` against `project`. Never fails: every problem is
    /// reported inside the returned [`BatchResult`].
    pub fn execute(&self, plan: &BatchPlan, project: &mut dyn ProjectApi) -> BatchResult {
        let mut rng = match self.settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.execute_with_rng(plan, project, &mut rng)
    }

    pub fn execute_with_rng<R: Rng + ?Sized>(
        &self,
        plan: &BatchPlan,
        project: &mut dyn ProjectApi,
        rng: &mut R,
    ) -> BatchResult {
        let undo_group_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut commands = parse_all(&plan.actions);

        project.begin_undo_group(&undo_group_id, &describe_batch(plan));

        let mut choices = SampleChoiceTable::seeded(&plan.sample_choices);
        samples::bind_samples(&mut commands, &mut choices, self.library, rng);
        tracks::provision(&commands, project, self.settings.max_playlist_tracks);
        conflicts::resolve_conflicts(&mut commands, &mut TrackOccupancy::new());

        let mut refs = CreatedRefs::new();
        let mut results = Vec::with_capacity(commands.len());
        for (index, command) in commands.into_iter().enumerate() {
            let result = self.run_step(index, command, project, &mut refs, &undo_group_id);
            results.push(result);
        }

        project.end_undo_group();

        let batch = BatchResult::aggregate(results, undo_group_id, choices.into_map());
        info!(
            event = events::BATCH_COMPLETED,
            undo_group_id = %batch.undo_group_id,
            source = ?plan.source,
            total = batch.total_actions,
            succeeded = batch.success_count,
            failed = batch.fail_count,
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "{}",
            batch.message
        );
        batch
    }

    fn run_step(
        &self,
        index: usize,
        command: Command,
        project: &mut dyn ProjectApi,
        refs: &mut CreatedRefs,
        undo_group_id: &str,
    ) -> ExecutionResult {
        let name = command.name();
        let audit_copy = self
            .audit_dir
            .as_ref()
            .filter(|_| self.settings.audit)
            .map(|dir| (dir, command.clone()));
        let started = Instant::now();

        let outcome = {
            let mut ctx = StepContext {
                project: &mut *project,
                library: self.library,
                refs: &mut *refs,
            };
            catch_unwind(AssertUnwindSafe(|| command.dispatch(&mut ctx)))
                .unwrap_or_else(|payload| {
                    Err(AppError::StepPanicked {
                        message: panic_message(payload.as_ref()),
                    })
                })
        };

        let (result, error_code) = match outcome {
            Ok(output) => (ExecutionResult::from_output(output), None),
            Err(e) => {
                warn!(
                    event = events::STEP_FAILED,
                    step = index,
                    action = name,
                    error = %e,
                    "Batch step failed"
                );
                (ExecutionResult::failed(name, &e), Some(e.code()))
            }
        };

        if let Some((dir, command)) = audit_copy {
            audit::log_step(
                dir,
                &audit::StepAudit {
                    undo_group_id,
                    step: index,
                    command: &command,
                    result: &result,
                    error_code,
                    duration: started.elapsed(),
                },
            );
        }
        result
    }
}

fn describe_batch(plan: &BatchPlan) -> String {
    plan.reasoning
        .clone()
        .unwrap_or_else(|| format!("AI batch ({} actions)", plan.len()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::model::{ChannelUpdate, ClipInput, ClipSource, EffectKey, NoteInput, NoteUpdate, SampleRef};
    use crate::project::{InMemoryProject, ProjectSummary};

    fn plan(actions: Value) -> BatchPlan {
        BatchPlan::from_value(&json!({ "actions": actions })).unwrap()
    }

    fn seeded() -> ExecutorSettings {
        ExecutorSettings {
            audit: false,
            rng_seed: Some(11),
            ..ExecutorSettings::default()
        }
    }

    fn run(project: &mut InMemoryProject, actions: Value) -> BatchResult {
        let lib = SampleLibrary::builtin();
        BatchExecutor::new(&lib, seeded()).execute(&plan(actions), project)
    }

    fn assert_counts(result: &BatchResult) {
        assert_eq!(result.success_count + result.fail_count, result.total_actions);
        assert_eq!(result.success, result.fail_count == 0);
        assert_eq!(result.results.len(), result.total_actions);
    }

    #[test]
    fn test_set_bpm_in_range() {
        let mut project = InMemoryProject::new();
        let result = run(&mut project, json!([{"action": "setBpm", "parameters": {"bpm": 128}}]));
        assert!(result.success);
        assert!(result.results[0].message.contains("128"));
        assert!((project.state().transport.bpm - 128.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_bpm_out_of_range_does_not_mutate() {
        let mut project = InMemoryProject::new();
        let before = project.state().transport.bpm;
        let result = run(&mut project, json!([{"action": "setBpm", "parameters": {"bpm": 1000}}]));
        assert!(!result.success);
        assert!(!result.results[0].success);
        assert!((project.state().transport.bpm - before).abs() < f64::EPSILON);
        assert_counts(&result);
    }

    #[test]
    fn test_current_pattern_resolves_to_step_one() {
        let mut project = InMemoryProject::new();
        project.create_pattern("Existing", 16).unwrap();
        let result = run(
            &mut project,
            json!([
                {"action": "addPattern", "parameters": {"name": "Test"}},
                {"action": "addNote", "parameters": {
                    "patternId": "current", "pitch": 60, "velocity": 100,
                    "startTick": 0, "duration": 96
                }}
            ]),
        );
        assert_eq!(result.success_count, 2);
        let created = project
            .state()
            .patterns
            .iter()
            .find(|p| p.name == "Test")
            .unwrap();
        assert_eq!(created.notes.len(), 1);
    }

    #[test]
    fn test_current_falls_back_to_latest_project_pattern() {
        let mut project = InMemoryProject::new();
        let id = project.create_pattern("Verse", 16).unwrap();
        let result = run(
            &mut project,
            json!([{"action": "addNote", "parameters": {"patternId": "current", "pitch": 64}}]),
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(project.pattern(&id).unwrap().notes.len(), 1);
    }

    #[test]
    fn test_missing_pattern_fails_in_isolation() {
        let mut project = InMemoryProject::new();
        let result = run(
            &mut project,
            json!([
                {"action": "setBpm", "parameters": {"bpm": 90}},
                {"action": "addNote", "parameters": {"patternId": "nope", "pitch": 60}},
                {"action": "addNote", "parameters": {"patternId": "current", "pitch": 60}},
                {"action": "play"}
            ]),
        );
        assert_counts(&result);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.fail_count, 2);
        assert!(result.results[0].success);
        assert!(result.results[1].error.as_deref().unwrap().contains("not found"));
        assert!(result.results[2].error.as_deref().unwrap().contains("not found"));
        assert!(result.results[3].success);
        assert!(result.message.contains("2 of 4"));
    }

    #[test]
    fn test_sample_consistency_across_batch() {
        let mut project = InMemoryProject::new();
        let steps: Vec<Value> = (0..8)
            .map(|i| {
                json!({"action": "addSample", "parameters": {
                    "category": "drums", "subcategory": "kick",
                    "trackIndex": 0, "startTick": i * 96, "duration": 96
                }})
            })
            .collect();
        let result = run(&mut project, Value::Array(steps));
        assert!(result.success, "{}", result.message);

        let ids: Vec<&str> = project
            .state()
            .clips
            .iter()
            .filter_map(|c| match &c.source {
                ClipSource::Sample(s) => Some(s.id.as_str()),
                ClipSource::Pattern(_) => None,
            })
            .collect();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(result.sample_choices.get("drums/kick").map(String::as_str), Some(ids[0]));
    }

    #[test]
    fn test_sample_choices_carry_over() {
        let lib = SampleLibrary::builtin();
        let mut project = InMemoryProject::new();
        let mut p = plan(json!([{"action": "addSample", "parameters": {
            "category": "drums", "subcategory": "snare", "trackIndex": 0, "startTick": 0, "duration": 96
        }}]));
        p.sample_choices.insert("drums/snare".into(), "snare_lofi".into());
        let result = BatchExecutor::new(&lib, seeded()).execute(&p, &mut project);
        assert!(result.success);
        assert_eq!(result.sample_choices["drums/snare"], "snare_lofi");
    }

    #[test]
    fn test_tracks_provisioned_and_conflicts_shifted() {
        let mut project = InMemoryProject::new();
        let hat = |tick: i64| {
            json!({"action": "addSample", "parameters": {
                "category": "drums", "subcategory": "hihat",
                "trackIndex": 2, "startTick": tick, "duration": 96
            }})
        };
        let result = run(&mut project, json!([hat(0), hat(0), hat(48)]));
        assert!(result.success, "{}", result.message);
        assert_eq!(project.playlist_track_count(), 3);

        let mut starts: Vec<u64> = project.state().clips.iter().map(|c| c.start_tick).collect();
        starts.sort_unstable();
        assert_eq!(starts, vec![0, 12, 48]);
    }

    #[test]
    fn test_distinct_start_ticks_are_never_moved() {
        let mut project = InMemoryProject::new();
        let hat = |tick: i64| {
            json!({"action": "addSample", "parameters": {
                "subcategory": "hihat", "trackIndex": 0, "startTick": tick, "duration": 24
            }})
        };
        let result = run(&mut project, json!([hat(0), hat(0), hat(12)]));
        assert!(result.success, "{}", result.message);
        let starts: Vec<u64> = project.state().clips.iter().map(|c| c.start_tick).collect();
        assert_eq!(starts, vec![0, 24, 12]);
    }

    #[test]
    fn test_unknown_and_clarification_are_failures() {
        let mut project = InMemoryProject::new();
        let result = run(
            &mut project,
            json!([
                {"action": "makeCoffee", "parameters": {}},
                {"action": "clarificationNeeded", "parameters": {
                    "question": "Which genre?", "options": ["trap", "house"]
                }}
            ]),
        );
        assert_eq!(result.fail_count, 2);
        assert_eq!(result.message, "Failed to execute all 2 actions");
        assert!(result.results[0].error.as_deref().unwrap().contains("makeCoffee"));
        assert_eq!(result.results[1].message, "Which genre?");
        assert_eq!(result.results[1].data.as_ref().unwrap()["options"][1], "house");
    }

    #[test]
    fn test_one_undo_reverts_whole_batch() {
        let mut project = InMemoryProject::new();
        let before = project.state().clone();
        let result = run(
            &mut project,
            json!([
                {"action": "setBpm", "parameters": {"bpm": 140}},
                {"action": "addPattern", "parameters": {"name": "Hook"}},
                {"action": "addNote", "parameters": {"pitch": 67}}
            ]),
        );
        assert!(result.success);
        project.undo().unwrap();
        assert_eq!(project.state(), &before);
    }

    #[test]
    fn test_empty_plan() {
        let mut project = InMemoryProject::new();
        let result = run(&mut project, json!([]));
        assert!(result.success);
        assert_eq!(result.total_actions, 0);
        assert!(!result.undo_group_id.is_empty());
    }

    #[test]
    fn test_audit_lines_written() {
        let dir = std::env::temp_dir().join(format!("vibe_beats_exec_audit_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let lib = SampleLibrary::builtin();
        let settings = ExecutorSettings { audit: true, ..seeded() };
        let mut project = InMemoryProject::new();
        BatchExecutor::new(&lib, settings)
            .with_audit_dir(&dir)
            .execute(
                &plan(json!([{"action": "play"}, {"action": "deletePattern", "parameters": {"id": "p9"}}])),
                &mut project,
            );

        let logs = crate::paths::batch_logs_dir(&dir);
        let file = std::fs::read_dir(&logs).unwrap().next().unwrap().unwrap().path();
        let lines: Vec<Value> = std::fs::read_to_string(file)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["outcome"], "applied");
        assert_eq!(lines[1]["action"], "deletePattern");
        assert_eq!(lines[1]["errorCode"], "NotFound");
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Collaborator whose BPM call panics; everything else is delegated.
    struct PanickyProject(InMemoryProject);

    impl ProjectApi for PanickyProject {
        fn create_pattern(&mut self, name: &str, length_steps: u32) -> Result<String, AppError> {
            self.0.create_pattern(name, length_steps)
        }
        fn delete_pattern(&mut self, id: &str) -> Result<(), AppError> {
            self.0.delete_pattern(id)
        }
        fn latest_pattern_id(&self) -> Option<String> {
            self.0.latest_pattern_id()
        }
        fn pattern_length_ticks(&self, id: &str) -> Option<u64> {
            self.0.pattern_length_ticks(id)
        }
        fn add_note(&mut self, id: &str, note: NoteInput) -> Result<String, AppError> {
            self.0.add_note(id, note)
        }
        fn add_note_sequence(&mut self, id: &str, notes: &[NoteInput]) -> Result<Vec<String>, AppError> {
            self.0.add_note_sequence(id, notes)
        }
        fn update_note(&mut self, p: &str, n: &str, u: NoteUpdate) -> Result<(), AppError> {
            self.0.update_note(p, n, u)
        }
        fn delete_note(&mut self, p: &str, n: &str) -> Result<(), AppError> {
            self.0.delete_note(p, n)
        }
        fn play(&mut self) -> Result<(), AppError> {
            self.0.play()
        }
        fn stop(&mut self) -> Result<(), AppError> {
            self.0.stop()
        }
        fn pause(&mut self) -> Result<(), AppError> {
            self.0.pause()
        }
        fn set_bpm(&mut self, _bpm: f64) -> Result<(), AppError> {
            panic!("transport offline")
        }
        fn set_position(&mut self, tick: u64) -> Result<(), AppError> {
            self.0.set_position(tick)
        }
        fn set_metronome(&mut self, enabled: Option<bool>) -> Result<bool, AppError> {
            self.0.set_metronome(enabled)
        }
        fn set_loop_region(&mut self, s: u64, e: u64) -> Result<(), AppError> {
            self.0.set_loop_region(s, e)
        }
        fn create_channel(&mut self, name: &str, sample: Option<&SampleRef>) -> Result<String, AppError> {
            self.0.create_channel(name, sample)
        }
        fn update_channel(&mut self, id: &str, u: ChannelUpdate) -> Result<(), AppError> {
            self.0.update_channel(id, u)
        }
        fn delete_channel(&mut self, id: &str) -> Result<(), AppError> {
            self.0.delete_channel(id)
        }
        fn load_channel_sample(&mut self, id: &str, s: &SampleRef) -> Result<(), AppError> {
            self.0.load_channel_sample(id, s)
        }
        fn latest_channel_id(&self) -> Option<String> {
            self.0.latest_channel_id()
        }
        fn mixer_track_count(&self) -> usize {
            self.0.mixer_track_count()
        }
        fn set_track_volume(&mut self, t: usize, v: f64) -> Result<(), AppError> {
            self.0.set_track_volume(t, v)
        }
        fn set_track_pan(&mut self, t: usize, p: f64) -> Result<(), AppError> {
            self.0.set_track_pan(t, p)
        }
        fn set_track_mute(&mut self, t: usize, m: bool) -> Result<(), AppError> {
            self.0.set_track_mute(t, m)
        }
        fn set_track_solo(&mut self, t: usize, s: bool) -> Result<(), AppError> {
            self.0.set_track_solo(t, s)
        }
        fn set_master_volume(&mut self, v: f64) -> Result<(), AppError> {
            self.0.set_master_volume(v)
        }
        fn playlist_track_count(&self) -> usize {
            self.0.playlist_track_count()
        }
        fn add_playlist_track(&mut self, name: Option<&str>) -> Result<usize, AppError> {
            self.0.add_playlist_track(name)
        }
        fn add_clip(&mut self, clip: ClipInput) -> Result<String, AppError> {
            self.0.add_clip(clip)
        }
        fn move_clip(&mut self, id: &str, t: Option<usize>, s: u64) -> Result<(), AppError> {
            self.0.move_clip(id, t, s)
        }
        fn resize_clip(&mut self, id: &str, l: u64) -> Result<(), AppError> {
            self.0.resize_clip(id, l)
        }
        fn delete_clip(&mut self, id: &str) -> Result<(), AppError> {
            self.0.delete_clip(id)
        }
        fn resolve_audio_asset(&mut self, s: &SampleRef) -> Result<String, AppError> {
            self.0.resolve_audio_asset(s)
        }
        fn add_effect(&mut self, t: usize, k: EffectKey, v: f64) -> Result<(), AppError> {
            self.0.add_effect(t, k, v)
        }
        fn update_effect(&mut self, t: usize, k: EffectKey, v: f64) -> Result<(), AppError> {
            self.0.update_effect(t, k, v)
        }
        fn remove_effect(&mut self, t: usize, k: EffectKey) -> Result<(), AppError> {
            self.0.remove_effect(t, k)
        }
        fn summary(&self) -> ProjectSummary {
            self.0.summary()
        }
    }

    #[test]
    fn test_panicking_step_is_isolated() {
        let lib = SampleLibrary::builtin();
        let mut project = PanickyProject(InMemoryProject::new());
        let result = BatchExecutor::new(&lib, seeded()).execute(
            &plan(json!([
                {"action": "setBpm", "parameters": {"bpm": 100}},
                {"action": "play"}
            ])),
            &mut project,
        );
        assert_counts(&result);
        assert_eq!(result.fail_count, 1);
        assert!(result.results[0].error.as_deref().unwrap().contains("transport offline"));
        assert!(result.results[1].success);
    }
}
