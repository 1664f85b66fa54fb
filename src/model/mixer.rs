use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// All insert effects a mixer track can host. Compile-time checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EffectKey {
    Reverb,
    Delay,
    Chorus,
    Distortion,
    Lowpass,
    Highpass,
}

impl EffectKey {
    pub fn all() -> &'static [EffectKey] {
        &[
            Self::Reverb,
            Self::Delay,
            Self::Chorus,
            Self::Distortion,
            Self::Lowpass,
            Self::Highpass,
        ]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Reverb => "reverb",
            Self::Delay => "delay",
            Self::Chorus => "chorus",
            Self::Distortion => "distortion",
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
        }
    }

    /// Case-insensitive lookup. Accepts a few spellings models commonly emit.
    pub fn from_slug(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "reverb" | "verb" => Some(Self::Reverb),
            "delay" | "echo" => Some(Self::Delay),
            "chorus" => Some(Self::Chorus),
            "distortion" | "drive" | "overdrive" => Some(Self::Distortion),
            "lowpass" | "lpf" | "lowpassfilter" => Some(Self::Lowpass),
            "highpass" | "hpf" | "highpassfilter" => Some(Self::Highpass),
            _ => None,
        }
    }

    /// Inclusive value range. Filters are cutoff frequencies in Hz, the rest are wet/dry amounts.
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Reverb | Self::Delay | Self::Chorus | Self::Distortion => (0.0, 1.0),
            Self::Lowpass => (100.0, 20_000.0),
            Self::Highpass => (20.0, 10_000.0),
        }
    }

    /// Value used when an effect is added without an explicit amount.
    pub fn default_value(self) -> f64 {
        match self {
            Self::Reverb | Self::Chorus => 0.3,
            Self::Delay => 0.25,
            Self::Distortion => 0.2,
            Self::Lowpass => 8_000.0,
            Self::Highpass => 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    pub key: EffectKey,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerTrack {
    pub name: String,
    pub volume: f64,
    pub pan: f64,
    pub muted: bool,
    pub solo: bool,
    pub effects: Vec<EffectSlot>,
}

impl MixerTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            effects: Vec::new(),
        }
    }

    pub fn effect_mut(&mut self, key: EffectKey) -> Option<&mut EffectSlot> {
        self.effects.iter_mut().find(|e| e.key == key)
    }
}
