#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{
    SetBpmParams, SetLoopRegionParams, SetPositionParams, ToggleMetronomeParams,
};
use crate::commands::validation::{validate_bpm, validate_loop_region, validate_tick};
use crate::commands::CommandOutput;
use crate::error::AppError;
use crate::model::time::format_position;

use super::StepContext;

pub fn play(ctx: &mut StepContext<'_>) -> Result<CommandOutput, AppError> {
    ctx.project.play()?;
    Ok(CommandOutput::unit("Playing"))
}

pub fn stop(ctx: &mut StepContext<'_>) -> Result<CommandOutput, AppError> {
    ctx.project.stop()?;
    Ok(CommandOutput::unit("Stopped"))
}

pub fn pause(ctx: &mut StepContext<'_>) -> Result<CommandOutput, AppError> {
    ctx.project.pause()?;
    Ok(CommandOutput::unit("Paused"))
}

pub fn set_bpm(ctx: &mut StepContext<'_>, p: SetBpmParams) -> Result<CommandOutput, AppError> {
    let bpm = validate_bpm(p.bpm)?;
    ctx.project.set_bpm(bpm)?;
    Ok(CommandOutput::data(
        format!("Set tempo to {bpm} BPM"),
        serde_json::json!({ "bpm": bpm }),
    ))
}

pub fn set_position(
    ctx: &mut StepContext<'_>,
    p: SetPositionParams,
) -> Result<CommandOutput, AppError> {
    let tick = validate_tick(p.tick)?;
    ctx.project.set_position(tick)?;
    Ok(CommandOutput::data(
        format!("Moved playhead to {}", format_position(tick)),
        serde_json::json!({ "tick": tick }),
    ))
}

pub fn toggle_metronome(
    ctx: &mut StepContext<'_>,
    p: ToggleMetronomeParams,
) -> Result<CommandOutput, AppError> {
    let enabled = ctx.project.set_metronome(p.enabled)?;
    Ok(CommandOutput::data(
        format!("Metronome {}", if enabled { "on" } else { "off" }),
        serde_json::json!({ "enabled": enabled }),
    ))
}

pub fn set_loop_region(
    ctx: &mut StepContext<'_>,
    p: SetLoopRegionParams,
) -> Result<CommandOutput, AppError> {
    let (start, end) = validate_loop_region(p.start_tick, p.end_tick)?;
    ctx.project.set_loop_region(start, end)?;
    Ok(CommandOutput::data(
        format!(
            "Looping {} to {}",
            format_position(start),
            format_position(end)
        ),
        serde_json::json!({ "startTick": start, "endTick": end }),
    ))
}
