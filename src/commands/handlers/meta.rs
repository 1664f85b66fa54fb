#![allow(clippy::needless_pass_by_value)]

use crate::commands::params::{ClarificationParams, UnknownParams};
use crate::commands::CommandOutput;
use crate::error::AppError;

use super::StepContext;

/// Not an action: the model is asking the user something. The executor
/// records this as an unsuccessful step carrying the question.
pub fn clarification_needed(
    _ctx: &mut StepContext<'_>,
    p: ClarificationParams,
) -> Result<CommandOutput, AppError> {
    Ok(CommandOutput::clarification(
        p.question.clone(),
        serde_json::json!({ "question": p.question, "options": p.options }),
    ))
}

pub fn unknown(_ctx: &mut StepContext<'_>, p: UnknownParams) -> Result<CommandOutput, AppError> {
    let reason = if p.reason.is_empty() {
        "unrecognized command".to_string()
    } else {
        p.reason
    };
    Err(AppError::validation(format!("Could not understand action: {reason}")))
}
