//! Per-step and per-batch outcome types returned to the caller.

use indexmap::IndexMap;
use serde::Serialize;
use ts_rs::TS;

use crate::commands::CommandOutput;
use crate::error::AppError;

/// How many failure messages a partial-success summary quotes.
const SUMMARY_FAILURES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown", optional)]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn from_output(output: CommandOutput) -> Self {
        if output.clarification {
            return Self {
                success: false,
                message: output.message,
                data: output.data,
                error: Some("Clarification needed".to_string()),
            };
        }
        Self {
            success: true,
            message: output.message,
            data: output.data,
            error: None,
        }
    }

    pub fn failed(action: &str, error: &AppError) -> Self {
        Self {
            success: false,
            message: format!("{action} failed: {error}"),
            data: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BatchResult {
    pub success: bool,
    pub message: String,
    pub total_actions: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<ExecutionResult>,
    pub undo_group_id: String,
    /// The batch's final sample bindings; pass back as `sampleChoices` to
    /// keep the same sounds on a follow-up request.
    #[ts(type = "Record<string, string>")]
    pub sample_choices: IndexMap<String, String>,
}

impl BatchResult {
    pub fn aggregate(
        results: Vec<ExecutionResult>,
        undo_group_id: String,
        sample_choices: IndexMap<String, String>,
    ) -> Self {
        let total_actions = results.len();
        let success_count = results.iter().filter(|r| r.success).count();
        let fail_count = total_actions - success_count;
        let message = summarize(&results, success_count, fail_count);
        Self {
            success: fail_count == 0,
            message,
            total_actions,
            success_count,
            fail_count,
            results,
            undo_group_id,
            sample_choices,
        }
    }
}

fn summarize(results: &[ExecutionResult], success_count: usize, fail_count: usize) -> String {
    let total = results.len();
    if fail_count == 0 {
        return format!("Executed {total} actions");
    }
    if success_count == 0 {
        return format!("Failed to execute all {total} actions");
    }
    let failures: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.error.as_deref().unwrap_or(r.message.as_str()))
        .collect();
    let mut message = format!(
        "Executed {success_count} of {total} actions ({fail_count} failed): {}",
        failures
            .iter()
            .take(SUMMARY_FAILURES)
            .copied()
            .collect::<Vec<_>>()
            .join("; ")
    );
    if failures.len() > SUMMARY_FAILURES {
        message.push_str(&format!(" (+{} more)", failures.len() - SUMMARY_FAILURES));
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn ok() -> ExecutionResult {
        ExecutionResult::from_output(CommandOutput::unit("done"))
    }

    fn fail(n: usize) -> ExecutionResult {
        ExecutionResult::failed("setBpm", &AppError::validation(format!("bad {n}")))
    }

    fn batch(results: Vec<ExecutionResult>) -> BatchResult {
        BatchResult::aggregate(results, "g".into(), IndexMap::new())
    }

    #[test]
    fn test_full_success_and_full_failure() {
        let all_ok = batch(vec![ok(), ok()]);
        assert!(all_ok.success);
        assert_eq!(all_ok.message, "Executed 2 actions");

        let all_bad = batch(vec![fail(1), fail(2), fail(3)]);
        assert!(!all_bad.success);
        assert_eq!(all_bad.message, "Failed to execute all 3 actions");
        assert_eq!(all_bad.fail_count, 3);
    }

    #[test]
    fn test_partial_summary_truncates() {
        let result = batch(vec![ok(), fail(1), fail(2), fail(3), fail(4), fail(5)]);
        assert_eq!(result.success_count + result.fail_count, result.total_actions);
        assert!(!result.success);
        assert!(result.message.starts_with("Executed 1 of 6 actions (5 failed)"));
        assert!(result.message.contains("bad 1; bad 2; bad 3"));
        assert!(!result.message.contains("bad 4"));
        assert!(result.message.ends_with("(+2 more)"));
    }

    #[test]
    fn test_partial_summary_without_suffix() {
        let result = batch(vec![ok(), fail(1)]);
        assert!(result.message.ends_with("bad 1"));
    }

    #[test]
    fn test_clarification_is_not_success() {
        let r = ExecutionResult::from_output(CommandOutput::clarification(
            "Which kick?",
            serde_json::json!({"question": "Which kick?", "options": []}),
        ));
        assert!(!r.success);
        assert_eq!(r.message, "Which kick?");
        assert_eq!(r.error.as_deref(), Some("Clarification needed"));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let json = serde_json::to_value(batch(vec![ok()])).unwrap();
        assert_eq!(json["totalActions"], 1);
        assert_eq!(json["undoGroupId"], "g");
        assert!(json["results"][0].get("error").is_none());
    }

    #[test]
    fn test_empty_batch_is_success() {
        let result = batch(Vec::new());
        assert!(result.success);
        assert_eq!(result.message, "Executed 0 actions");
    }
}
