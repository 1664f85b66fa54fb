use serde::{Deserialize, Serialize};

use super::sample::SampleRef;

/// A channel-rack entry: one instrument or sample source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub sample: Option<SampleRef>,
    pub volume: f64,
    pub pan: f64,
    pub muted: bool,
}

/// Partial channel edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub volume: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
}

impl ChannelUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.volume.is_none() && self.pan.is_none() && self.muted.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub name: String,
}

/// What a playlist clip plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ref")]
pub enum ClipSource {
    Pattern(String),
    Sample(SampleRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub source: ClipSource,
    pub track_index: usize,
    pub start_tick: u64,
    pub length_ticks: u64,
}

/// Validated clip data handed to the project when placing content on the playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInput {
    pub source: ClipSource,
    pub track_index: usize,
    pub start_tick: u64,
    pub length_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub state: PlayState,
    pub bpm: f64,
    pub position_tick: u64,
    pub metronome: bool,
    pub loop_region: Option<(u64, u64)>,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            state: PlayState::Stopped,
            bpm: 120.0,
            position_tick: 0,
            metronome: false,
            loop_region: None,
        }
    }
}
