//! Domain range checks shared by every step handler.
//!
//! Each validator either returns the value narrowed to the type the project
//! API wants, or a `ValidationError` with a message fit to show the user.
//! Handlers run all of their validators before the first mutation call.

use crate::error::AppError;
use crate::model::EffectKey;

pub const PITCH_RANGE: (i64, i64) = (0, 127);
pub const VELOCITY_RANGE: (i64, i64) = (0, 127);
pub const BPM_RANGE: (f64, f64) = (20.0, 999.0);
pub const PAN_RANGE: (f64, f64) = (-1.0, 1.0);
pub const PATTERN_LENGTH_RANGE: (i64, i64) = (1, 256);

/// Volume ceilings differ between a mixer insert and the master bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeScope {
    Track,
    Master,
}

impl VolumeScope {
    pub fn max(self) -> f64 {
        match self {
            VolumeScope::Track => 1.5,
            VolumeScope::Master => 2.0,
        }
    }
}

fn finite(value: f64, name: &str) -> Result<f64, AppError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::validation(format!("{name} must be a finite number")))
    }
}

pub fn validate_pitch(pitch: i64) -> Result<u8, AppError> {
    u8::try_from(pitch)
        .ok()
        .filter(|p| i64::from(*p) <= PITCH_RANGE.1)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Pitch {pitch} is out of range ({}-{})",
                PITCH_RANGE.0, PITCH_RANGE.1
            ))
        })
}

pub fn validate_velocity(velocity: i64) -> Result<u8, AppError> {
    u8::try_from(velocity)
        .ok()
        .filter(|v| i64::from(*v) <= VELOCITY_RANGE.1)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Velocity {velocity} is out of range ({}-{})",
                VELOCITY_RANGE.0, VELOCITY_RANGE.1
            ))
        })
}

pub fn validate_bpm(bpm: f64) -> Result<f64, AppError> {
    let bpm = finite(bpm, "BPM")?;
    if (BPM_RANGE.0..=BPM_RANGE.1).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(AppError::validation(format!(
            "BPM {bpm} is out of range ({}-{})",
            BPM_RANGE.0, BPM_RANGE.1
        )))
    }
}

pub fn validate_volume(volume: f64, scope: VolumeScope) -> Result<f64, AppError> {
    let volume = finite(volume, "Volume")?;
    if (0.0..=scope.max()).contains(&volume) {
        Ok(volume)
    } else {
        Err(AppError::validation(format!(
            "Volume {volume} is out of range (0-{})",
            scope.max()
        )))
    }
}

pub fn validate_pan(pan: f64) -> Result<f64, AppError> {
    let pan = finite(pan, "Pan")?;
    if (PAN_RANGE.0..=PAN_RANGE.1).contains(&pan) {
        Ok(pan)
    } else {
        Err(AppError::validation(format!("Pan {pan} is out of range (-1 to 1)")))
    }
}

pub fn validate_pattern_length(steps: i64) -> Result<u32, AppError> {
    if (PATTERN_LENGTH_RANGE.0..=PATTERN_LENGTH_RANGE.1).contains(&steps) {
        u32::try_from(steps).map_err(|_| AppError::validation("Pattern length overflow"))
    } else {
        Err(AppError::validation(format!(
            "Pattern length {steps} is out of range ({}-{} steps)",
            PATTERN_LENGTH_RANGE.0, PATTERN_LENGTH_RANGE.1
        )))
    }
}

pub fn validate_tick(tick: i64) -> Result<u64, AppError> {
    u64::try_from(tick)
        .map_err(|_| AppError::validation(format!("Tick {tick} must not be negative")))
}

pub fn validate_duration(duration: i64) -> Result<u64, AppError> {
    u64::try_from(duration)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| AppError::validation(format!("Duration {duration} must be positive")))
}

/// `count` is the number of tracks the target currently has.
pub fn validate_track_index(index: i64, count: usize) -> Result<usize, AppError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < count)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Track index {index} is out of range (project has {count} tracks)"
            ))
        })
}

pub fn validate_effect_key(name: &str) -> Result<EffectKey, AppError> {
    EffectKey::from_slug(name).ok_or_else(|| {
        let known: Vec<&str> = EffectKey::all().iter().map(|k| k.slug()).collect();
        AppError::validation(format!(
            "Unknown effect \"{name}\" (expected one of: {})",
            known.join(", ")
        ))
    })
}

pub fn validate_effect_value(key: EffectKey, value: f64) -> Result<f64, AppError> {
    let value = finite(value, key.slug())?;
    let (min, max) = key.range();
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "{} value {value} is out of range ({min}-{max})",
            key.slug()
        )))
    }
}

pub fn validate_loop_region(start: i64, end: i64) -> Result<(u64, u64), AppError> {
    let start_tick = validate_tick(start)?;
    let end_tick = validate_tick(end)?;
    if end_tick <= start_tick {
        return Err(AppError::validation(format!(
            "Loop end ({end}) must be after loop start ({start})"
        )));
    }
    Ok((start_tick, end_tick))
}

pub fn validate_name(name: &str, what: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(AppError::validation(format!("{what} name must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}
