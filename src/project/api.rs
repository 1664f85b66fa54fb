//! The project mutation contract consumed by the batch executor.
//!
//! The executor never reaches for a global store: every step receives the
//! collaborator explicitly and talks to it only through this trait. Each
//! method either succeeds (returning a new id where one is minted) or
//! returns a domain error that the executor records as a failed step.

use serde::Serialize;

use crate::error::AppError;
use crate::model::{ChannelUpdate, ClipInput, EffectKey, NoteInput, NoteUpdate, SampleRef};

/// Read-only digest of the project used to build the model's context prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub bpm: f64,
    pub playing: bool,
    pub position_tick: u64,
    pub patterns: Vec<PatternSummary>,
    pub channels: Vec<ChannelSummary>,
    pub playlist_tracks: usize,
    pub mixer_tracks: usize,
    pub clips: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSummary {
    pub id: String,
    pub name: String,
    pub note_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub sample: Option<String>,
}

pub trait ProjectApi {
    // ── Patterns ─────────────────────────────────────────────────
    fn create_pattern(&mut self, name: &str, length_steps: u32) -> Result<String, AppError>;
    fn delete_pattern(&mut self, pattern_id: &str) -> Result<(), AppError>;
    /// The most recently created pattern still present in the project.
    fn latest_pattern_id(&self) -> Option<String>;
    fn pattern_length_ticks(&self, pattern_id: &str) -> Option<u64>;

    // ── Notes ────────────────────────────────────────────────────
    fn add_note(&mut self, pattern_id: &str, note: NoteInput) -> Result<String, AppError>;
    fn add_note_sequence(
        &mut self,
        pattern_id: &str,
        notes: &[NoteInput],
    ) -> Result<Vec<String>, AppError>;
    fn update_note(
        &mut self,
        pattern_id: &str,
        note_id: &str,
        update: NoteUpdate,
    ) -> Result<(), AppError>;
    fn delete_note(&mut self, pattern_id: &str, note_id: &str) -> Result<(), AppError>;

    // ── Transport ────────────────────────────────────────────────
    fn play(&mut self) -> Result<(), AppError>;
    fn stop(&mut self) -> Result<(), AppError>;
    fn pause(&mut self) -> Result<(), AppError>;
    fn set_bpm(&mut self, bpm: f64) -> Result<(), AppError>;
    fn set_position(&mut self, tick: u64) -> Result<(), AppError>;
    /// Set the metronome, or flip it when `enabled` is `None`. Returns the new state.
    fn set_metronome(&mut self, enabled: Option<bool>) -> Result<bool, AppError>;
    fn set_loop_region(&mut self, start_tick: u64, end_tick: u64) -> Result<(), AppError>;

    // ── Channels ─────────────────────────────────────────────────
    fn create_channel(&mut self, name: &str, sample: Option<&SampleRef>)
        -> Result<String, AppError>;
    fn update_channel(&mut self, channel_id: &str, update: ChannelUpdate) -> Result<(), AppError>;
    fn delete_channel(&mut self, channel_id: &str) -> Result<(), AppError>;
    fn load_channel_sample(&mut self, channel_id: &str, sample: &SampleRef)
        -> Result<(), AppError>;
    /// The most recently created channel still present in the project.
    fn latest_channel_id(&self) -> Option<String>;

    // ── Mixer ────────────────────────────────────────────────────
    fn mixer_track_count(&self) -> usize;
    fn set_track_volume(&mut self, track: usize, volume: f64) -> Result<(), AppError>;
    fn set_track_pan(&mut self, track: usize, pan: f64) -> Result<(), AppError>;
    fn set_track_mute(&mut self, track: usize, muted: bool) -> Result<(), AppError>;
    fn set_track_solo(&mut self, track: usize, solo: bool) -> Result<(), AppError>;
    fn set_master_volume(&mut self, volume: f64) -> Result<(), AppError>;

    // ── Playlist ─────────────────────────────────────────────────
    fn playlist_track_count(&self) -> usize;
    /// Append a playlist track. Returns its index.
    fn add_playlist_track(&mut self, name: Option<&str>) -> Result<usize, AppError>;
    fn add_clip(&mut self, clip: ClipInput) -> Result<String, AppError>;
    fn move_clip(
        &mut self,
        clip_id: &str,
        track_index: Option<usize>,
        start_tick: u64,
    ) -> Result<(), AppError>;
    fn resize_clip(&mut self, clip_id: &str, length_ticks: u64) -> Result<(), AppError>;
    fn delete_clip(&mut self, clip_id: &str) -> Result<(), AppError>;

    // ── Samples ──────────────────────────────────────────────────
    /// Resolve a catalog sample to a loadable asset handle (URL or path).
    fn resolve_audio_asset(&mut self, sample: &SampleRef) -> Result<String, AppError>;

    // ── Effects ──────────────────────────────────────────────────
    fn add_effect(&mut self, track: usize, key: EffectKey, value: f64) -> Result<(), AppError>;
    fn update_effect(&mut self, track: usize, key: EffectKey, value: f64)
        -> Result<(), AppError>;
    fn remove_effect(&mut self, track: usize, key: EffectKey) -> Result<(), AppError>;

    // ── Undo grouping ────────────────────────────────────────────
    /// Open an undo group. Mutations until [`ProjectApi::end_undo_group`] are
    /// reverted together. Collaborators without undo support ignore it.
    fn begin_undo_group(&mut self, _group_id: &str, _description: &str) {}
    fn end_undo_group(&mut self) {}

    fn summary(&self) -> ProjectSummary;
}
