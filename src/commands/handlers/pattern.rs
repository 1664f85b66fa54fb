#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{AddPatternParams, PatternRefParams};
use crate::commands::validation::{validate_name, validate_pattern_length};
use crate::commands::CommandOutput;
use crate::error::AppError;

use super::StepContext;

pub fn add_pattern(
    ctx: &mut StepContext<'_>,
    p: AddPatternParams,
) -> Result<CommandOutput, AppError> {
    let name = validate_name(&p.name, "Pattern")?;
    let length_steps = validate_pattern_length(p.length_steps)?;
    let id = ctx.project.create_pattern(&name, length_steps)?;
    ctx.refs.record_pattern(&id);
    Ok(CommandOutput::data(
        format!("Created pattern \"{name}\" ({length_steps} steps)"),
        serde_json::json!({ "patternId": id, "name": name, "lengthSteps": length_steps }),
    ))
}

pub fn delete_pattern(
    ctx: &mut StepContext<'_>,
    p: PatternRefParams,
) -> Result<CommandOutput, AppError> {
    let id = ctx.pattern_id(&p.pattern_id)?;
    ctx.project.delete_pattern(&id)?;
    ctx.refs.forget_pattern(&id);
    Ok(CommandOutput::data(
        format!("Deleted pattern {id}"),
        serde_json::json!({ "patternId": id }),
    ))
}
