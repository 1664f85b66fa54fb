use serde::{Deserialize, Serialize};

use super::catalog;
use super::handlers::{channel, effect, meta, mixer, note, pattern, playlist, transport, StepContext};
use super::params::{
    AddChannelParams, AddClipParams, AddNoteParams, AddNotesParams, AddPatternParams,
    AddPlaylistTrackParams, AddSampleParams, ChannelRefParams, ClarificationParams, ClipRefParams,
    DeleteNoteParams, EffectParams, LoadSampleParams, MoveClipParams, PatternRefParams,
    RemoveEffectParams, ResizeClipParams, SampleSpec, SetBpmParams, SetLoopRegionParams,
    SetMasterVolumeParams, SetMuteParams, SetPanParams, SetPositionParams, SetSoloParams,
    SetVolumeParams, ToggleMetronomeParams, UnknownParams, UpdateChannelParams, UpdateNoteParams,
};

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandFamily {
    Pattern,
    Note,
    Transport,
    Channel,
    Mixer,
    Playlist,
    Effect,
    Meta,
}

impl CommandFamily {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Note => "note",
            Self::Transport => "transport",
            Self::Channel => "channel",
            Self::Mixer => "mixer",
            Self::Playlist => "playlist",
            Self::Effect => "effect",
            Self::Meta => "meta",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pattern => "Create and delete patterns",
            Self::Note => "Add, edit and remove notes inside a pattern",
            Self::Transport => "Playback, tempo, position, metronome and loop region",
            Self::Channel => "Channel rack instruments and their samples",
            Self::Mixer => "Per-track volume, pan, mute and solo, plus master volume",
            Self::Playlist => "Playlist tracks, pattern clips and sample placements",
            Self::Effect => "Insert effects on mixer tracks",
            Self::Meta => "Ask the user a question instead of acting",
        }
    }

    pub fn all() -> &'static [CommandFamily] {
        &[
            Self::Pattern,
            Self::Note,
            Self::Transport,
            Self::Channel,
            Self::Mixer,
            Self::Playlist,
            Self::Effect,
            Self::Meta,
        ]
    }
}

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub family: CommandFamily,
    pub undoable: bool,
    pub llm_hidden: bool,
}

// ── Command output ──────────────────────────────────────────────

/// What a step handler hands back on success. `message` is shown to the
/// user, `data` carries ids and resolved values for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub message: String,
    pub data: Option<serde_json::Value>,
    /// Set when the step asked the user a question instead of acting.
    pub clarification: bool,
}

impl CommandOutput {
    pub fn unit(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            clarification: false,
        }
    }

    pub fn data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            clarification: false,
        }
    }

    pub fn clarification(question: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: question.into(),
            data: Some(data),
            clarification: true,
        }
    }
}

/// Fold an action name for alias matching: `set_bpm`, `SetBPM` and
/// `set-bpm` all fold to `setbpm`.
fn fold_action(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for every action the model may emit. Generates:
/// 1. `Command` enum (serde-tagged by `action`)
/// 2. `Command::info()`: metadata (name, description, family, flags)
/// 3. `Command::dispatch()`: run the step handler against a `StepContext`
/// 4. `Command::registry_entries()`: catalog entries with JSON schemas
/// 5. `canonical_action()`: alias-tolerant action name lookup
/// 6. `Command::from_action()`: decode params for a canonical name
macro_rules! define_commands {
    (
        params {
            $(
                [ $pc:expr $(, $pf:ident)* ]
                $pv:ident ( $pp:ty )
                => $ph:path, $pn:literal $(| $pa:literal)* : $pd:literal ;
            )*
        }
        no_params {
            $(
                [ $nc:expr $(, $nf:ident)* ]
                $nv:ident
                => $nh:path, $nn:literal $(| $na:literal)* : $nd:literal ;
            )*
        }
    ) => {
        // ── 1. Command enum ──
        /// A fully typed step of a batch. Adding a variant causes compiler
        /// errors until it is handled everywhere.
        #[derive(Debug, Clone, Serialize)]
        #[serde(tag = "action", content = "parameters")]
        pub enum Command {
            $( #[serde(rename = $pn)] $pv($pp), )*
            $( #[serde(rename = $nn)] $nv, )*
        }

        // ── 2. Command::info() ──
        impl Command {
            pub fn info(&self) -> CommandInfo {
                match self {
                    $( Command::$pv(_) => CommandInfo {
                        name: $pn,
                        description: $pd,
                        family: $pc,
                        undoable: define_commands!(@has_flag undoable; $($pf)*),
                        llm_hidden: define_commands!(@has_flag llm_hidden; $($pf)*),
                    }, )*
                    $( Command::$nv => CommandInfo {
                        name: $nn,
                        description: $nd,
                        family: $nc,
                        undoable: define_commands!(@has_flag undoable; $($nf)*),
                        llm_hidden: define_commands!(@has_flag llm_hidden; $($nf)*),
                    }, )*
                }
            }
        }

        // ── 3. Command::dispatch() ──
        impl Command {
            pub(crate) fn dispatch(
                self,
                ctx: &mut StepContext<'_>,
            ) -> Result<CommandOutput, crate::error::AppError> {
                match self {
                    $( Command::$pv(p) => $ph(ctx, p), )*
                    $( Command::$nv => $nh(ctx), )*
                }
            }
        }

        // ── 4. Command::registry_entries() ──
        impl Command {
            pub(crate) fn registry_entries() -> Vec<catalog::CommandRegistryEntry> {
                vec![
                    $( catalog::entry(
                        CommandInfo {
                            name: $pn,
                            description: $pd,
                            family: $pc,
                            undoable: define_commands!(@has_flag undoable; $($pf)*),
                            llm_hidden: define_commands!(@has_flag llm_hidden; $($pf)*),
                        },
                        &[$($pa),*],
                        catalog::schema_value::<$pp>(),
                    ), )*
                    $( catalog::entry(
                        CommandInfo {
                            name: $nn,
                            description: $nd,
                            family: $nc,
                            undoable: define_commands!(@has_flag undoable; $($nf)*),
                            llm_hidden: define_commands!(@has_flag llm_hidden; $($nf)*),
                        },
                        &[$($na),*],
                        catalog::empty_object_schema(),
                    ), )*
                ]
            }
        }

        // ── 5. canonical_action() ──
        /// Map any accepted spelling or alias of an action to its wire name.
        pub fn canonical_action(raw: &str) -> Option<&'static str> {
            let folded = fold_action(raw);
            if folded.is_empty() {
                return None;
            }
            $( if [$pn $(, $pa)*].iter().any(|n| fold_action(n) == folded) {
                return Some($pn);
            } )*
            $( if [$nn $(, $na)*].iter().any(|n| fold_action(n) == folded) {
                return Some($nn);
            } )*
            None
        }

        // ── 6. Command::from_action() ──
        impl Command {
            /// Decode `parameters` for a canonical action name.
            pub(crate) fn from_action(
                name: &str,
                parameters: &serde_json::Value,
            ) -> Result<Command, String> {
                match name {
                    $( $pn => Ok(Command::$pv(catalog::de(parameters)?)), )*
                    $( $nn => Ok(Command::$nv), )*
                    _ => Err(format!("Unknown action: {name}")),
                }
            }
        }
    };

    // Flag helpers: check whether a specific flag appears in a list of flags.
    (@has_flag undoable; undoable $($rest:ident)*) => { true };
    (@has_flag undoable; $_other:ident $($rest:ident)*) => { define_commands!(@has_flag undoable; $($rest)*) };
    (@has_flag undoable;) => { false };

    (@has_flag llm_hidden; llm_hidden $($rest:ident)*) => { true };
    (@has_flag llm_hidden; $_other:ident $($rest:ident)*) => { define_commands!(@has_flag llm_hidden; $($rest)*) };
    (@has_flag llm_hidden;) => { false };
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    params {
        // ── Pattern (2) ─────────────────────────────────────────
        [CommandFamily::Pattern, undoable]
        AddPattern(AddPatternParams)
        => pattern::add_pattern, "addPattern" | "createPattern" | "newPattern"
        : "Create an empty pattern. Later steps can refer to it as patternId \"current\".";

        [CommandFamily::Pattern, undoable]
        DeletePattern(PatternRefParams)
        => pattern::delete_pattern, "deletePattern" | "removePattern"
        : "Delete a pattern and every clip that plays it.";

        // ── Note (4) ────────────────────────────────────────────
        [CommandFamily::Note, undoable]
        AddNote(AddNoteParams)
        => note::add_note, "addNote" | "createNote" | "insertNote"
        : "Add one note (pitch 0-127, velocity 0-127, startTick, duration in ticks) to a pattern.";

        [CommandFamily::Note, undoable]
        AddNotes(AddNotesParams)
        => note::add_notes, "addNotes" | "addNoteSequence" | "addMelody" | "addChord"
        : "Add several notes to a pattern in one step.";

        [CommandFamily::Note, undoable]
        UpdateNote(UpdateNoteParams)
        => note::update_note, "updateNote" | "editNote" | "moveNote"
        : "Change pitch, velocity, start or duration of an existing note.";

        [CommandFamily::Note, undoable]
        DeleteNote(DeleteNoteParams)
        => note::delete_note, "deleteNote" | "removeNote"
        : "Remove a note from a pattern.";

        // ── Transport (4 with params) ───────────────────────────
        [CommandFamily::Transport, undoable]
        SetBpm(SetBpmParams)
        => transport::set_bpm, "setBpm" | "setTempo" | "changeTempo" | "tempo"
        : "Set the project tempo (20-999 BPM).";

        [CommandFamily::Transport]
        SetPosition(SetPositionParams)
        => transport::set_position, "setPosition" | "seek" | "jumpTo"
        : "Move the playhead to a tick (96 ticks per beat).";

        [CommandFamily::Transport]
        ToggleMetronome(ToggleMetronomeParams)
        => transport::toggle_metronome, "toggleMetronome" | "setMetronome" | "metronome"
        : "Turn the metronome on or off; omit `enabled` to flip it.";

        [CommandFamily::Transport, undoable]
        SetLoopRegion(SetLoopRegionParams)
        => transport::set_loop_region, "setLoopRegion" | "setLoop" | "loopRegion"
        : "Loop playback between two ticks.";

        // ── Channel (4) ─────────────────────────────────────────
        [CommandFamily::Channel, undoable]
        AddChannel(AddChannelParams)
        => channel::add_channel, "addChannel" | "createChannel" | "addInstrument"
        : "Add a channel, optionally loaded with a sample by category/subcategory or sampleId.";

        [CommandFamily::Channel, undoable]
        UpdateChannel(UpdateChannelParams)
        => channel::update_channel, "updateChannel" | "editChannel" | "renameChannel"
        : "Rename a channel or change its volume, pan or mute state.";

        [CommandFamily::Channel, undoable]
        DeleteChannel(ChannelRefParams)
        => channel::delete_channel, "deleteChannel" | "removeChannel"
        : "Remove a channel from the channel rack.";

        [CommandFamily::Channel, undoable]
        LoadSample(LoadSampleParams)
        => channel::load_sample, "loadSample" | "setChannelSample" | "loadChannelSample"
        : "Load a sample into a channel.";

        // ── Mixer (5) ───────────────────────────────────────────
        [CommandFamily::Mixer, undoable]
        SetVolume(SetVolumeParams)
        => mixer::set_volume, "setVolume" | "setTrackVolume"
        : "Set a mixer track's volume (0-1.5).";

        [CommandFamily::Mixer, undoable]
        SetPan(SetPanParams)
        => mixer::set_pan, "setPan" | "setTrackPan" | "pan"
        : "Set a mixer track's pan (-1 left to 1 right).";

        [CommandFamily::Mixer, undoable]
        SetMute(SetMuteParams)
        => mixer::set_mute, "setMute" | "muteTrack" | "mute"
        : "Mute or unmute a mixer track.";

        [CommandFamily::Mixer, undoable]
        SetSolo(SetSoloParams)
        => mixer::set_solo, "setSolo" | "soloTrack" | "solo"
        : "Solo or unsolo a mixer track.";

        [CommandFamily::Mixer, undoable]
        SetMasterVolume(SetMasterVolumeParams)
        => mixer::set_master_volume, "setMasterVolume" | "masterVolume"
        : "Set the master volume (0-2).";

        // ── Playlist (6) ────────────────────────────────────────
        [CommandFamily::Playlist, undoable]
        AddPlaylistTrack(AddPlaylistTrackParams)
        => playlist::add_playlist_track, "addPlaylistTrack" | "addTrack" | "createTrack"
        : "Append a playlist track.";

        [CommandFamily::Playlist, undoable]
        AddClip(AddClipParams)
        => playlist::add_clip, "addClip" | "placePattern" | "addPatternClip"
        : "Place a pattern on a playlist track at a tick. Missing tracks are created.";

        [CommandFamily::Playlist, undoable]
        AddSample(AddSampleParams)
        => playlist::add_sample, "addSample" | "placeSample" | "addSampleClip"
        : "Place a sample (category/subcategory or sampleId) on a playlist track at a tick.";

        [CommandFamily::Playlist, undoable]
        MoveClip(MoveClipParams)
        => playlist::move_clip, "moveClip"
        : "Move a clip to another tick and optionally another track.";

        [CommandFamily::Playlist, undoable]
        ResizeClip(ResizeClipParams)
        => playlist::resize_clip, "resizeClip" | "setClipLength"
        : "Change a clip's length in ticks.";

        [CommandFamily::Playlist, undoable]
        DeleteClip(ClipRefParams)
        => playlist::delete_clip, "deleteClip" | "removeClip"
        : "Remove a clip from the playlist.";

        // ── Effect (3) ──────────────────────────────────────────
        [CommandFamily::Effect, undoable]
        AddEffect(EffectParams)
        => effect::add_effect, "addEffect" | "insertEffect"
        : "Add an insert effect (reverb, delay, chorus, distortion, lowpass, highpass) to a mixer track.";

        [CommandFamily::Effect, undoable]
        UpdateEffect(EffectParams)
        => effect::update_effect, "updateEffect" | "setEffect" | "setEffectValue"
        : "Change the amount or cutoff of an existing effect.";

        [CommandFamily::Effect, undoable]
        RemoveEffect(RemoveEffectParams)
        => effect::remove_effect, "removeEffect" | "deleteEffect"
        : "Remove an effect from a mixer track.";

        // ── Meta (2) ────────────────────────────────────────────
        [CommandFamily::Meta]
        ClarificationNeeded(ClarificationParams)
        => meta::clarification_needed, "clarificationNeeded" | "clarify" | "askUser"
        : "Ask the user a question instead of acting. Use only when the request is ambiguous.";

        [CommandFamily::Meta, llm_hidden]
        Unknown(UnknownParams)
        => meta::unknown, "unknown"
        : "Input that could not be understood.";
    }
    no_params {
        // ── Transport (3) ───────────────────────────────────────
        [CommandFamily::Transport]
        Play => transport::play, "play" | "start" | "startPlayback" | "resume"
        : "Start playback.";

        [CommandFamily::Transport]
        Stop => transport::stop, "stop" | "stopPlayback"
        : "Stop playback and return to the start.";

        [CommandFamily::Transport]
        Pause => transport::pause, "pause" | "pausePlayback"
        : "Pause playback at the current position.";
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn unknown(original_text: impl Into<String>, reason: impl Into<String>) -> Self {
        Command::Unknown(UnknownParams {
            original_text: original_text.into(),
            reason: reason.into(),
        })
    }

    /// The sample query of steps that load or place a sample.
    pub fn sample_spec(&self) -> Option<&SampleSpec> {
        match self {
            Command::AddChannel(p) => Some(&p.sample),
            Command::LoadSample(p) => Some(&p.sample),
            Command::AddSample(p) => Some(&p.sample),
            _ => None,
        }
    }

    pub fn sample_spec_mut(&mut self) -> Option<&mut SampleSpec> {
        match self {
            Command::AddChannel(p) => Some(&mut p.sample),
            Command::LoadSample(p) => Some(&mut p.sample),
            Command::AddSample(p) => Some(&mut p.sample),
            _ => None,
        }
    }

    /// Playlist track index this step writes to, if any.
    pub fn playlist_track(&self) -> Option<i64> {
        match self {
            Command::AddClip(p) => Some(p.track_index),
            Command::AddSample(p) => Some(p.track_index),
            Command::MoveClip(p) => p.track_index,
            _ => None,
        }
    }

    /// `(trackIndex, startTick)` of steps that place new content on the playlist.
    pub fn placement_mut(&mut self) -> Option<(i64, &mut i64)> {
        match self {
            Command::AddClip(p) => Some((p.track_index, &mut p.start_tick)),
            Command::AddSample(p) => Some((p.track_index, &mut p.start_tick)),
            _ => None,
        }
    }
}
