#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{
    AddClipParams, AddPlaylistTrackParams, AddSampleParams, ClipRefParams, MoveClipParams,
    ResizeClipParams,
};
use crate::commands::validation::{validate_duration, validate_tick, validate_track_index};
use crate::commands::CommandOutput;
use crate::error::AppError;
use crate::model::time::format_position;
use crate::model::{ClipInput, ClipSource};

use super::StepContext;

fn playlist_track(ctx: &StepContext<'_>, index: i64) -> Result<usize, AppError> {
    validate_track_index(index, ctx.project.playlist_track_count())
}

pub fn add_playlist_track(
    ctx: &mut StepContext<'_>,
    p: AddPlaylistTrackParams,
) -> Result<CommandOutput, AppError> {
    let name = p.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let index = ctx.project.add_playlist_track(name)?;
    Ok(CommandOutput::data(
        format!("Added playlist track {index}"),
        serde_json::json!({ "trackIndex": index }),
    ))
}

pub fn add_clip(ctx: &mut StepContext<'_>, p: AddClipParams) -> Result<CommandOutput, AppError> {
    let track = playlist_track(ctx, p.track_index)?;
    let start = validate_tick(p.start_tick)?;
    let explicit_length = p.length_ticks.map(validate_duration).transpose()?;
    let pattern_id = ctx.pattern_id(&p.pattern_id)?;
    let length = match explicit_length {
        Some(l) => l,
        None => ctx
            .project
            .pattern_length_ticks(&pattern_id)
            .ok_or_else(|| AppError::not_found(format!("Pattern '{pattern_id}'")))?,
    };
    let clip_id = ctx.project.add_clip(ClipInput {
        source: ClipSource::Pattern(pattern_id.clone()),
        track_index: track,
        start_tick: start,
        length_ticks: length,
    })?;
    Ok(CommandOutput::data(
        format!(
            "Placed pattern {pattern_id} on track {track} at {}",
            format_position(start)
        ),
        serde_json::json!({
            "clipId": clip_id,
            "patternId": pattern_id,
            "trackIndex": track,
            "startTick": start,
        }),
    ))
}

pub fn add_sample(ctx: &mut StepContext<'_>, p: AddSampleParams) -> Result<CommandOutput, AppError> {
    let track = playlist_track(ctx, p.track_index)?;
    let start = validate_tick(p.start_tick)?;
    let length = validate_duration(p.duration)?;
    let sample = ctx.sample(&p.sample)?;
    let asset = ctx.project.resolve_audio_asset(&sample)?;
    let clip_id = ctx.project.add_clip(ClipInput {
        source: ClipSource::Sample(sample.clone()),
        track_index: track,
        start_tick: start,
        length_ticks: length,
    })?;
    Ok(CommandOutput::data(
        format!(
            "Placed \"{}\" on track {track} at {}",
            sample.name,
            format_position(start)
        ),
        serde_json::json!({
            "clipId": clip_id,
            "sampleId": sample.id,
            "asset": asset,
            "trackIndex": track,
            "startTick": start,
        }),
    ))
}

pub fn move_clip(ctx: &mut StepContext<'_>, p: MoveClipParams) -> Result<CommandOutput, AppError> {
    let track = p
        .track_index
        .map(|t| playlist_track(ctx, t))
        .transpose()?;
    let start = validate_tick(p.start_tick)?;
    ctx.project.move_clip(&p.clip_id, track, start)?;
    Ok(CommandOutput::unit(format!(
        "Moved clip {} to {}",
        p.clip_id,
        format_position(start)
    )))
}

pub fn resize_clip(
    ctx: &mut StepContext<'_>,
    p: ResizeClipParams,
) -> Result<CommandOutput, AppError> {
    let length = validate_duration(p.length_ticks)?;
    ctx.project.resize_clip(&p.clip_id, length)?;
    Ok(CommandOutput::unit(format!(
        "Resized clip {} to {length} ticks",
        p.clip_id
    )))
}

pub fn delete_clip(ctx: &mut StepContext<'_>, p: ClipRefParams) -> Result<CommandOutput, AppError> {
    ctx.project.delete_clip(&p.clip_id)?;
    Ok(CommandOutput::unit(format!("Deleted clip {}", p.clip_id)))
}
