#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{
    SetMasterVolumeParams, SetMuteParams, SetPanParams, SetSoloParams, SetVolumeParams,
};
use crate::commands::validation::{
    validate_pan, validate_track_index, validate_volume, VolumeScope,
};
use crate::commands::CommandOutput;
use crate::error::AppError;

use super::StepContext;

fn mixer_track(ctx: &StepContext<'_>, index: i64) -> Result<usize, AppError> {
    validate_track_index(index, ctx.project.mixer_track_count())
}

pub fn set_volume(ctx: &mut StepContext<'_>, p: SetVolumeParams) -> Result<CommandOutput, AppError> {
    let track = mixer_track(ctx, p.track_index)?;
    let volume = validate_volume(p.volume, VolumeScope::Track)?;
    ctx.project.set_track_volume(track, volume)?;
    Ok(CommandOutput::unit(format!("Set track {track} volume to {volume}")))
}

pub fn set_pan(ctx: &mut StepContext<'_>, p: SetPanParams) -> Result<CommandOutput, AppError> {
    let track = mixer_track(ctx, p.track_index)?;
    let pan = validate_pan(p.pan)?;
    ctx.project.set_track_pan(track, pan)?;
    Ok(CommandOutput::unit(format!("Set track {track} pan to {pan}")))
}

pub fn set_mute(ctx: &mut StepContext<'_>, p: SetMuteParams) -> Result<CommandOutput, AppError> {
    let track = mixer_track(ctx, p.track_index)?;
    let muted = p.muted.unwrap_or(true);
    ctx.project.set_track_mute(track, muted)?;
    Ok(CommandOutput::unit(format!(
        "{} track {track}",
        if muted { "Muted" } else { "Unmuted" }
    )))
}

pub fn set_solo(ctx: &mut StepContext<'_>, p: SetSoloParams) -> Result<CommandOutput, AppError> {
    let track = mixer_track(ctx, p.track_index)?;
    let solo = p.solo.unwrap_or(true);
    ctx.project.set_track_solo(track, solo)?;
    Ok(CommandOutput::unit(format!(
        "{} track {track}",
        if solo { "Soloed" } else { "Unsoloed" }
    )))
}

pub fn set_master_volume(
    ctx: &mut StepContext<'_>,
    p: SetMasterVolumeParams,
) -> Result<CommandOutput, AppError> {
    let volume = validate_volume(p.volume, VolumeScope::Master)?;
    ctx.project.set_master_volume(volume)?;
    Ok(CommandOutput::unit(format!("Set master volume to {volume}")))
}
