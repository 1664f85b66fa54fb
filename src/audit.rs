//! JSONL audit trail of executed batch steps.
//!
//! One line per step in `{app_config_dir}/batch-logs/YYYY-MM-DD.jsonl`,
//! carrying the typed command, how it ended and what it returned. Writing
//! is best-effort: an unwritable directory is ignored.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::commands::Command;
use crate::executor::ExecutionResult;

/// Everything the executor knows about one finished step.
pub struct StepAudit<'a> {
    pub undo_group_id: &'a str,
    pub step: usize,
    pub command: &'a Command,
    pub result: &'a ExecutionResult,
    /// `AppError::code()` when the step returned an error.
    pub error_code: Option<&'static str>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
enum StepOutcome {
    Applied,
    Failed,
    Clarification,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditLine<'a> {
    ts: u64,
    undo_group_id: &'a str,
    step: usize,
    #[serde(flatten)]
    command: &'a Command,
    outcome: StepOutcome,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    duration_ms: u64,
}

impl StepAudit<'_> {
    fn outcome(&self) -> StepOutcome {
        match (self.result.success, self.error_code) {
            (true, _) => StepOutcome::Applied,
            (false, Some(_)) => StepOutcome::Failed,
            (false, None) => StepOutcome::Clarification,
        }
    }
}

pub fn log_step(app_config_dir: &Path, audit: &StepAudit<'_>) {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());

    let line = AuditLine {
        ts,
        undo_group_id: audit.undo_group_id,
        step: audit.step,
        command: audit.command,
        outcome: audit.outcome(),
        message: &audit.result.message,
        data: audit.result.data.as_ref(),
        error_code: audit.error_code,
        duration_ms: u64::try_from(audit.duration.as_millis()).unwrap_or(u64::MAX),
    };
    let Ok(json) = serde_json::to_string(&line) else {
        return;
    };

    let dir = crate::paths::batch_logs_dir(app_config_dir);
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let path = dir.join(format!("{}.jsonl", log_file_date(ts)));
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{json}");
    }
}

/// `YYYY-MM-DD` (UTC) for a unix timestamp.
fn log_file_date(epoch_secs: u64) -> String {
    let days = i64::try_from(epoch_secs / 86_400).unwrap_or(i64::MAX / 2);
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Proleptic Gregorian date for a day count since 1970-01-01, computed in
/// 400-year eras starting on March 1st.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let shifted = days + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let march_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * march_month + 2) / 5 + 1;
    let month = if march_month < 10 { march_month + 3 } else { march_month - 9 };
    let year = era * 400 + year_of_era + i64::from(month <= 2);
    (year, month, day)
}
