#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{
    AddNoteParams, AddNotesParams, DeleteNoteParams, NoteParams, UpdateNoteParams,
};
use crate::commands::validation::{
    validate_duration, validate_pitch, validate_tick, validate_velocity,
};
use crate::commands::CommandOutput;
use crate::error::AppError;
use crate::model::{NoteInput, NoteUpdate};

use super::StepContext;

fn note_input(p: &NoteParams) -> Result<NoteInput, AppError> {
    Ok(NoteInput {
        pitch: validate_pitch(p.pitch)?,
        velocity: validate_velocity(p.velocity)?,
        start_tick: validate_tick(p.start_tick)?,
        duration: validate_duration(p.duration)?,
    })
}

pub fn add_note(ctx: &mut StepContext<'_>, p: AddNoteParams) -> Result<CommandOutput, AppError> {
    let note = note_input(&p.note)?;
    let pattern_id = ctx.pattern_id(&p.pattern_id)?;
    let note_id = ctx.project.add_note(&pattern_id, note)?;
    Ok(CommandOutput::data(
        format!(
            "Added note {} at tick {} to pattern {pattern_id}",
            note.pitch, note.start_tick
        ),
        serde_json::json!({ "noteId": note_id, "patternId": pattern_id }),
    ))
}

pub fn add_notes(ctx: &mut StepContext<'_>, p: AddNotesParams) -> Result<CommandOutput, AppError> {
    if p.notes.is_empty() {
        return Err(AppError::validation("Note sequence is empty"));
    }
    // Validate the whole sequence up front so a bad note rejects all of them.
    let notes = p
        .notes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            note_input(n).map_err(|e| AppError::validation(format!("Note {}: {e}", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let pattern_id = ctx.pattern_id(&p.pattern_id)?;
    let ids = ctx.project.add_note_sequence(&pattern_id, &notes)?;
    Ok(CommandOutput::data(
        format!("Added {} notes to pattern {pattern_id}", ids.len()),
        serde_json::json!({ "noteIds": ids, "patternId": pattern_id }),
    ))
}

pub fn update_note(
    ctx: &mut StepContext<'_>,
    p: UpdateNoteParams,
) -> Result<CommandOutput, AppError> {
    let update = NoteUpdate {
        pitch: p.pitch.map(validate_pitch).transpose()?,
        velocity: p.velocity.map(validate_velocity).transpose()?,
        start_tick: p.start_tick.map(validate_tick).transpose()?,
        duration: p.duration.map(validate_duration).transpose()?,
    };
    if update.is_empty() {
        return Err(AppError::validation("updateNote needs at least one field to change"));
    }
    let pattern_id = ctx.pattern_id(&p.pattern_id)?;
    ctx.project.update_note(&pattern_id, &p.note_id, update)?;
    Ok(CommandOutput::data(
        format!("Updated note {}", p.note_id),
        serde_json::json!({ "noteId": p.note_id, "patternId": pattern_id }),
    ))
}

pub fn delete_note(
    ctx: &mut StepContext<'_>,
    p: DeleteNoteParams,
) -> Result<CommandOutput, AppError> {
    let pattern_id = ctx.pattern_id(&p.pattern_id)?;
    ctx.project.delete_note(&pattern_id, &p.note_id)?;
    Ok(CommandOutput::unit(format!(
        "Deleted note {} from pattern {pattern_id}",
        p.note_id
    )))
}
