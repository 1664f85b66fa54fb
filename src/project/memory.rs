//! In-memory project used as the reference collaborator and in tests.

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::AppError;
use crate::model::{
    Channel, ChannelUpdate, Clip, ClipInput, ClipSource, EffectKey, EffectSlot, MixerTrack, Note,
    NoteInput, NoteUpdate, Pattern, PlayState, PlaylistTrack, SampleRef, Transport,
};
use crate::model::time::steps_to_ticks;

use super::api::{ChannelSummary, PatternSummary, ProjectApi, ProjectSummary};
use super::history::{UndoHistory, UndoState};

const DEFAULT_MIXER_TRACKS: usize = 8;
const DEFAULT_ASSET_ROOT: &str = "/samples";
/// Recently resolved asset handles kept for inspection.
const RESOLVED_ASSET_HISTORY: usize = 64;

/// The mutable part of a project. Cloned whole for undo snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectState {
    pub patterns: Vec<Pattern>,
    pub channels: Vec<Channel>,
    pub mixer: Vec<MixerTrack>,
    pub master_volume: f64,
    pub playlist: Vec<PlaylistTrack>,
    pub clips: Vec<Clip>,
    pub transport: Transport,
}

impl ProjectState {
    fn pattern_mut(&mut self, id: &str) -> Result<&mut Pattern, AppError> {
        self.patterns
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found(format!("Pattern '{id}'")))
    }

    fn channel_mut(&mut self, id: &str) -> Result<&mut Channel, AppError> {
        self.channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("Channel '{id}'")))
    }

    fn clip_mut(&mut self, id: &str) -> Result<&mut Clip, AppError> {
        self.clips
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("Clip '{id}'")))
    }

    fn mixer_mut(&mut self, track: usize) -> Result<&mut MixerTrack, AppError> {
        self.mixer.get_mut(track).ok_or(AppError::InvalidIndex {
            what: "mixer track".into(),
            index: track,
        })
    }
}

/// Monotonic id source. Lives outside [`ProjectState`] so undo never re-issues an id.
#[derive(Debug, Default)]
struct IdGen {
    next: u64,
}

impl IdGen {
    fn mint(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}

pub struct InMemoryProject {
    state: ProjectState,
    history: UndoHistory<ProjectState>,
    ids: IdGen,
    active_group: Option<(String, String)>,
    asset_root: String,
    resolved_assets: VecDeque<String>,
}

impl Default for InMemoryProject {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProject {
    pub fn new() -> Self {
        Self {
            state: ProjectState {
                patterns: Vec::new(),
                channels: Vec::new(),
                mixer: (0..DEFAULT_MIXER_TRACKS)
                    .map(|i| MixerTrack::new(format!("Insert {}", i + 1)))
                    .collect(),
                master_volume: 1.0,
                playlist: Vec::new(),
                clips: Vec::new(),
                transport: Transport::default(),
            },
            history: UndoHistory::new(),
            ids: IdGen::default(),
            active_group: None,
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
            resolved_assets: VecDeque::new(),
        }
    }

    pub fn with_playlist_tracks(mut self, count: usize) -> Self {
        self.state.playlist = (0..count)
            .map(|i| PlaylistTrack {
                name: format!("Track {}", i + 1),
            })
            .collect();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn pattern(&self, id: &str) -> Option<&Pattern> {
        self.state.patterns.iter().find(|p| p.id == id)
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.state.channels.iter().find(|c| c.id == id)
    }

    /// Asset handles handed out by `resolve_audio_asset`, in order.
    /// The most recent asset handles, oldest first.
    pub fn resolved_assets(&self) -> &VecDeque<String> {
        &self.resolved_assets
    }

    pub fn undo(&mut self) -> Result<String, AppError> {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> Result<String, AppError> {
        self.history.redo(&mut self.state)
    }

    pub fn undo_state(&self) -> UndoState {
        self.history.undo_state()
    }

    /// Apply `f` atomically: on error the state is restored, on success the
    /// pre-mutation state is recorded for undo.
    fn mutate<R>(
        &mut self,
        description: &str,
        f: impl FnOnce(&mut ProjectState, &mut IdGen) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let before = self.state.clone();
        match f(&mut self.state, &mut self.ids) {
            Ok(r) => {
                let (group_id, group_desc) = match &self.active_group {
                    Some((id, desc)) => (Some(id.as_str()), desc.as_str()),
                    None => (None, description),
                };
                self.history.checkpoint(group_id, group_desc, &before);
                Ok(r)
            }
            Err(e) => {
                self.state = before;
                Err(e)
            }
        }
    }
}

impl ProjectApi for InMemoryProject {
    fn create_pattern(&mut self, name: &str, length_steps: u32) -> Result<String, AppError> {
        self.mutate(&format!("Create pattern \"{name}\""), |s, ids| {
            let id = ids.mint("pattern");
            s.patterns.push(Pattern {
                id: id.clone(),
                name: name.to_string(),
                length_steps,
                notes: Vec::new(),
            });
            Ok(id)
        })
    }

    fn delete_pattern(&mut self, pattern_id: &str) -> Result<(), AppError> {
        self.mutate("Delete pattern", |s, _| {
            let before = s.patterns.len();
            s.patterns.retain(|p| p.id != pattern_id);
            if s.patterns.len() == before {
                return Err(AppError::not_found(format!("Pattern '{pattern_id}'")));
            }
            s.clips
                .retain(|c| !matches!(&c.source, ClipSource::Pattern(p) if p == pattern_id));
            Ok(())
        })
    }

    fn latest_pattern_id(&self) -> Option<String> {
        self.state.patterns.last().map(|p| p.id.clone())
    }

    fn pattern_length_ticks(&self, pattern_id: &str) -> Option<u64> {
        self.pattern(pattern_id)
            .map(|p| steps_to_ticks(u64::from(p.length_steps)))
    }

    fn add_note(&mut self, pattern_id: &str, note: NoteInput) -> Result<String, AppError> {
        self.mutate("Add note", |s, ids| {
            let pattern = s.pattern_mut(pattern_id)?;
            let id = ids.mint("note");
            pattern.insert_note(Note {
                id: id.clone(),
                pitch: note.pitch,
                velocity: note.velocity,
                start_tick: note.start_tick,
                duration: note.duration,
            });
            Ok(id)
        })
    }

    fn add_note_sequence(
        &mut self,
        pattern_id: &str,
        notes: &[NoteInput],
    ) -> Result<Vec<String>, AppError> {
        self.mutate(&format!("Add {} notes", notes.len()), |s, ids| {
            let pattern = s.pattern_mut(pattern_id)?;
            let mut created = Vec::with_capacity(notes.len());
            for note in notes {
                let id = ids.mint("note");
                pattern.insert_note(Note {
                    id: id.clone(),
                    pitch: note.pitch,
                    velocity: note.velocity,
                    start_tick: note.start_tick,
                    duration: note.duration,
                });
                created.push(id);
            }
            Ok(created)
        })
    }

    fn update_note(
        &mut self,
        pattern_id: &str,
        note_id: &str,
        update: NoteUpdate,
    ) -> Result<(), AppError> {
        self.mutate("Update note", |s, _| {
            let pattern = s.pattern_mut(pattern_id)?;
            let note = pattern
                .note_mut(note_id)
                .ok_or_else(|| AppError::not_found(format!("Note '{note_id}'")))?;
            update.apply(note);
            pattern.notes.sort_by_key(|n| n.start_tick);
            Ok(())
        })
    }

    fn delete_note(&mut self, pattern_id: &str, note_id: &str) -> Result<(), AppError> {
        self.mutate("Delete note", |s, _| {
            let pattern = s.pattern_mut(pattern_id)?;
            let before = pattern.notes.len();
            pattern.notes.retain(|n| n.id != note_id);
            if pattern.notes.len() == before {
                return Err(AppError::not_found(format!("Note '{note_id}'")));
            }
            Ok(())
        })
    }

    // Transport changes are not part of the undo history.
    fn play(&mut self) -> Result<(), AppError> {
        self.state.transport.state = PlayState::Playing;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AppError> {
        self.state.transport.state = PlayState::Stopped;
        self.state.transport.position_tick = 0;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AppError> {
        self.state.transport.state = PlayState::Paused;
        Ok(())
    }

    fn set_bpm(&mut self, bpm: f64) -> Result<(), AppError> {
        self.mutate("Set tempo", |s, _| {
            s.transport.bpm = bpm;
            Ok(())
        })
    }

    fn set_position(&mut self, tick: u64) -> Result<(), AppError> {
        self.state.transport.position_tick = tick;
        Ok(())
    }

    fn set_metronome(&mut self, enabled: Option<bool>) -> Result<bool, AppError> {
        let t = &mut self.state.transport;
        t.metronome = enabled.unwrap_or(!t.metronome);
        Ok(t.metronome)
    }

    fn set_loop_region(&mut self, start_tick: u64, end_tick: u64) -> Result<(), AppError> {
        self.mutate("Set loop region", |s, _| {
            s.transport.loop_region = Some((start_tick, end_tick));
            Ok(())
        })
    }

    fn create_channel(
        &mut self,
        name: &str,
        sample: Option<&SampleRef>,
    ) -> Result<String, AppError> {
        self.mutate(&format!("Add channel \"{name}\""), |s, ids| {
            let id = ids.mint("channel");
            s.channels.push(Channel {
                id: id.clone(),
                name: name.to_string(),
                sample: sample.cloned(),
                volume: 1.0,
                pan: 0.0,
                muted: false,
            });
            Ok(id)
        })
    }

    fn update_channel(&mut self, channel_id: &str, update: ChannelUpdate) -> Result<(), AppError> {
        self.mutate("Update channel", |s, _| {
            let channel = s.channel_mut(channel_id)?;
            if let Some(name) = update.name {
                channel.name = name;
            }
            if let Some(v) = update.volume {
                channel.volume = v;
            }
            if let Some(p) = update.pan {
                channel.pan = p;
            }
            if let Some(m) = update.muted {
                channel.muted = m;
            }
            Ok(())
        })
    }

    fn delete_channel(&mut self, channel_id: &str) -> Result<(), AppError> {
        self.mutate("Delete channel", |s, _| {
            let before = s.channels.len();
            s.channels.retain(|c| c.id != channel_id);
            if s.channels.len() == before {
                return Err(AppError::not_found(format!("Channel '{channel_id}'")));
            }
            Ok(())
        })
    }

    fn load_channel_sample(
        &mut self,
        channel_id: &str,
        sample: &SampleRef,
    ) -> Result<(), AppError> {
        self.mutate("Load sample", |s, _| {
            s.channel_mut(channel_id)?.sample = Some(sample.clone());
            Ok(())
        })
    }

    fn latest_channel_id(&self) -> Option<String> {
        self.state.channels.last().map(|c| c.id.clone())
    }

    fn mixer_track_count(&self) -> usize {
        self.state.mixer.len()
    }

    fn set_track_volume(&mut self, track: usize, volume: f64) -> Result<(), AppError> {
        self.mutate("Set volume", |s, _| {
            s.mixer_mut(track)?.volume = volume;
            Ok(())
        })
    }

    fn set_track_pan(&mut self, track: usize, pan: f64) -> Result<(), AppError> {
        self.mutate("Set pan", |s, _| {
            s.mixer_mut(track)?.pan = pan;
            Ok(())
        })
    }

    fn set_track_mute(&mut self, track: usize, muted: bool) -> Result<(), AppError> {
        self.mutate("Set mute", |s, _| {
            s.mixer_mut(track)?.muted = muted;
            Ok(())
        })
    }

    fn set_track_solo(&mut self, track: usize, solo: bool) -> Result<(), AppError> {
        self.mutate("Set solo", |s, _| {
            s.mixer_mut(track)?.solo = solo;
            Ok(())
        })
    }

    fn set_master_volume(&mut self, volume: f64) -> Result<(), AppError> {
        self.mutate("Set master volume", |s, _| {
            s.master_volume = volume;
            Ok(())
        })
    }

    fn playlist_track_count(&self) -> usize {
        self.state.playlist.len()
    }

    fn add_playlist_track(&mut self, name: Option<&str>) -> Result<usize, AppError> {
        self.mutate("Add playlist track", |s, _| {
            let index = s.playlist.len();
            s.playlist.push(PlaylistTrack {
                name: name.map_or_else(|| format!("Track {}", index + 1), str::to_string),
            });
            Ok(index)
        })
    }

    fn add_clip(&mut self, clip: ClipInput) -> Result<String, AppError> {
        self.mutate("Add clip", |s, ids| {
            if clip.track_index >= s.playlist.len() {
                return Err(AppError::InvalidIndex {
                    what: "playlist track".into(),
                    index: clip.track_index,
                });
            }
            if let ClipSource::Pattern(pattern_id) = &clip.source {
                if !s.patterns.iter().any(|p| &p.id == pattern_id) {
                    return Err(AppError::not_found(format!("Pattern '{pattern_id}'")));
                }
            }
            let id = ids.mint("clip");
            s.clips.push(Clip {
                id: id.clone(),
                source: clip.source,
                track_index: clip.track_index,
                start_tick: clip.start_tick,
                length_ticks: clip.length_ticks,
            });
            Ok(id)
        })
    }

    fn move_clip(
        &mut self,
        clip_id: &str,
        track_index: Option<usize>,
        start_tick: u64,
    ) -> Result<(), AppError> {
        self.mutate("Move clip", |s, _| {
            let track_count = s.playlist.len();
            let clip = s.clip_mut(clip_id)?;
            if let Some(t) = track_index {
                if t >= track_count {
                    return Err(AppError::InvalidIndex {
                        what: "playlist track".into(),
                        index: t,
                    });
                }
                clip.track_index = t;
            }
            clip.start_tick = start_tick;
            Ok(())
        })
    }

    fn resize_clip(&mut self, clip_id: &str, length_ticks: u64) -> Result<(), AppError> {
        self.mutate("Resize clip", |s, _| {
            s.clip_mut(clip_id)?.length_ticks = length_ticks;
            Ok(())
        })
    }

    fn delete_clip(&mut self, clip_id: &str) -> Result<(), AppError> {
        self.mutate("Delete clip", |s, _| {
            let before = s.clips.len();
            s.clips.retain(|c| c.id != clip_id);
            if s.clips.len() == before {
                return Err(AppError::not_found(format!("Clip '{clip_id}'")));
            }
            Ok(())
        })
    }

    fn resolve_audio_asset(&mut self, sample: &SampleRef) -> Result<String, AppError> {
        if sample.path.is_empty() {
            return Err(AppError::not_found(format!("Audio for sample '{}'", sample.id)));
        }
        let root = self.asset_root.trim_end_matches('/');
        let handle = format!("{root}/{}", sample.path.trim_start_matches('/'));
        if self.resolved_assets.len() == RESOLVED_ASSET_HISTORY {
            self.resolved_assets.pop_front();
        }
        self.resolved_assets.push_back(handle.clone());
        Ok(handle)
    }

    fn add_effect(&mut self, track: usize, key: EffectKey, value: f64) -> Result<(), AppError> {
        self.mutate(&format!("Add {}", key.slug()), |s, _| {
            let mixer = s.mixer_mut(track)?;
            if mixer.effect_mut(key).is_some() {
                return Err(AppError::validation(format!(
                    "Track {track} already has {}",
                    key.slug()
                )));
            }
            mixer.effects.push(EffectSlot { key, value });
            Ok(())
        })
    }

    fn update_effect(&mut self, track: usize, key: EffectKey, value: f64) -> Result<(), AppError> {
        self.mutate(&format!("Update {}", key.slug()), |s, _| {
            let slot = s
                .mixer_mut(track)?
                .effect_mut(key)
                .ok_or_else(|| AppError::not_found(format!("{} on track {track}", key.slug())))?;
            slot.value = value;
            Ok(())
        })
    }

    fn remove_effect(&mut self, track: usize, key: EffectKey) -> Result<(), AppError> {
        self.mutate(&format!("Remove {}", key.slug()), |s, _| {
            let mixer = s.mixer_mut(track)?;
            let before = mixer.effects.len();
            mixer.effects.retain(|e| e.key != key);
            if mixer.effects.len() == before {
                return Err(AppError::not_found(format!("{} on track {track}", key.slug())));
            }
            Ok(())
        })
    }

    fn begin_undo_group(&mut self, group_id: &str, description: &str) {
        self.active_group = Some((group_id.to_string(), description.to_string()));
    }

    fn end_undo_group(&mut self) {
        self.active_group = None;
    }

    fn summary(&self) -> ProjectSummary {
        let s = &self.state;
        ProjectSummary {
            bpm: s.transport.bpm,
            playing: s.transport.state == PlayState::Playing,
            position_tick: s.transport.position_tick,
            patterns: s
                .patterns
                .iter()
                .map(|p| PatternSummary {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    note_count: p.notes.len(),
                })
                .collect(),
            channels: s
                .channels
                .iter()
                .map(|c| ChannelSummary {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    sample: c.sample.as_ref().map(|x| x.id.clone()),
                })
                .collect(),
            playlist_tracks: s.playlist.len(),
            mixer_tracks: s.mixer.len(),
            clips: s.clips.len(),
        }
    }
}
