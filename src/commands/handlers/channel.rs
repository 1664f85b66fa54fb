#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{
    AddChannelParams, ChannelRefParams, LoadSampleParams, UpdateChannelParams,
};
use crate::commands::validation::{validate_name, validate_pan, validate_volume, VolumeScope};
use crate::commands::CommandOutput;
use crate::error::AppError;
use crate::model::ChannelUpdate;

use super::StepContext;

pub fn add_channel(
    ctx: &mut StepContext<'_>,
    p: AddChannelParams,
) -> Result<CommandOutput, AppError> {
    let sample = if p.sample.is_empty() {
        None
    } else {
        Some(ctx.sample(&p.sample)?)
    };
    let name = match (&p.name, &sample) {
        (Some(n), _) => validate_name(n, "Channel")?,
        (None, Some(s)) => s.name.clone(),
        (None, None) => "Channel".to_string(),
    };
    let asset = match &sample {
        Some(s) => Some(ctx.project.resolve_audio_asset(s)?),
        None => None,
    };
    let id = ctx.project.create_channel(&name, sample.as_ref())?;
    ctx.refs.record_channel(&id);
    let message = match &sample {
        Some(s) => format!("Added channel \"{name}\" with sample \"{}\"", s.name),
        None => format!("Added channel \"{name}\""),
    };
    Ok(CommandOutput::data(
        message,
        serde_json::json!({
            "channelId": id,
            "sampleId": sample.as_ref().map(|s| s.id.clone()),
            "asset": asset,
        }),
    ))
}

pub fn update_channel(
    ctx: &mut StepContext<'_>,
    p: UpdateChannelParams,
) -> Result<CommandOutput, AppError> {
    let update = ChannelUpdate {
        name: p
            .name
            .as_deref()
            .map(|n| validate_name(n, "Channel"))
            .transpose()?,
        volume: p
            .volume
            .map(|v| validate_volume(v, VolumeScope::Track))
            .transpose()?,
        pan: p.pan.map(validate_pan).transpose()?,
        muted: p.muted,
    };
    if update.is_empty() {
        return Err(AppError::validation("updateChannel needs at least one field to change"));
    }
    let id = ctx.channel_id(&p.channel_id)?;
    ctx.project.update_channel(&id, update)?;
    Ok(CommandOutput::data(
        format!("Updated channel {id}"),
        serde_json::json!({ "channelId": id }),
    ))
}

pub fn delete_channel(
    ctx: &mut StepContext<'_>,
    p: ChannelRefParams,
) -> Result<CommandOutput, AppError> {
    let id = ctx.channel_id(&p.channel_id)?;
    ctx.project.delete_channel(&id)?;
    ctx.refs.forget_channel(&id);
    Ok(CommandOutput::unit(format!("Deleted channel {id}")))
}

pub fn load_sample(
    ctx: &mut StepContext<'_>,
    p: LoadSampleParams,
) -> Result<CommandOutput, AppError> {
    let sample = ctx.sample(&p.sample)?;
    let id = ctx.channel_id(&p.channel_id)?;
    let asset = ctx.project.resolve_audio_asset(&sample)?;
    ctx.project.load_channel_sample(&id, &sample)?;
    Ok(CommandOutput::data(
        format!("Loaded \"{}\" into channel {id}", sample.name),
        serde_json::json!({ "channelId": id, "sampleId": sample.id, "asset": asset }),
    ))
}
