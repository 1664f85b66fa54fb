#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{EffectParams, RemoveEffectParams};
use crate::commands::validation::{
    validate_effect_key, validate_effect_value, validate_track_index,
};
use crate::commands::CommandOutput;
use crate::error::AppError;

use super::StepContext;

pub fn add_effect(ctx: &mut StepContext<'_>, p: EffectParams) -> Result<CommandOutput, AppError> {
    let track = validate_track_index(p.track_index, ctx.project.mixer_track_count())?;
    let key = validate_effect_key(&p.effect)?;
    let value = validate_effect_value(key, p.value.unwrap_or_else(|| key.default_value()))?;
    ctx.project.add_effect(track, key, value)?;
    Ok(CommandOutput::data(
        format!("Added {} ({value}) to track {track}", key.slug()),
        serde_json::json!({ "trackIndex": track, "effect": key, "value": value }),
    ))
}

pub fn update_effect(
    ctx: &mut StepContext<'_>,
    p: EffectParams,
) -> Result<CommandOutput, AppError> {
    let track = validate_track_index(p.track_index, ctx.project.mixer_track_count())?;
    let key = validate_effect_key(&p.effect)?;
    let value = p
        .value
        .ok_or_else(|| AppError::validation(format!("updateEffect needs a value for {}", key.slug())))?;
    let value = validate_effect_value(key, value)?;
    ctx.project.update_effect(track, key, value)?;
    Ok(CommandOutput::data(
        format!("Set {} on track {track} to {value}", key.slug()),
        serde_json::json!({ "trackIndex": track, "effect": key, "value": value }),
    ))
}

pub fn remove_effect(
    ctx: &mut StepContext<'_>,
    p: RemoveEffectParams,
) -> Result<CommandOutput, AppError> {
    let track = validate_track_index(p.track_index, ctx.project.mixer_track_count())?;
    let key = validate_effect_key(&p.effect)?;
    ctx.project.remove_effect(track, key)?;
    Ok(CommandOutput::unit(format!(
        "Removed {} from track {track}",
        key.slug()
    )))
}
