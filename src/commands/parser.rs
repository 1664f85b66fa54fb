//! Raw `{action, parameters}` → typed [`Command`].
//!
//! Parsing is total: an unrecognized action or a parameter bag that does
//! not decode becomes [`Command::Unknown`] carrying the raw entry and the
//! reason. It has no side effects and may be called repeatedly.

use crate::executor::plan::RawAction;

use super::command::{canonical_action, Command};

pub fn parse(raw: &RawAction) -> Command {
    let original = || serde_json::to_string(raw).unwrap_or_else(|_| raw.action.clone());

    if raw.action.trim().is_empty() {
        return Command::unknown(original(), "Missing action");
    }
    let Some(name) = canonical_action(&raw.action) else {
        return Command::unknown(original(), format!("Unrecognized action \"{}\"", raw.action));
    };
    match Command::from_action(name, &raw.parameters) {
        // An explicit `unknown` from the model keeps its own text and reason.
        Ok(Command::Unknown(mut p)) => {
            if p.original_text.is_empty() {
                p.original_text = original();
            }
            Command::Unknown(p)
        }
        Ok(cmd) => cmd,
        Err(reason) => Command::unknown(original(), format!("Invalid parameters for {name}: {reason}")),
    }
}

pub fn parse_all(actions: &[RawAction]) -> Vec<Command> {
    actions.iter().map(parse).collect()
}
