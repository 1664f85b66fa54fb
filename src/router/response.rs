//! Decoding model reply text into a [`BatchPlan`].

use serde_json::Value;

use crate::executor::{BatchPlan, RawAction};

/// Remove a surrounding markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) up to the first newline.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the reply as JSON, falling back to the outermost `{...}` span when
/// the model wrapped the object in prose.
fn parse_json(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    let span = text.get(start..=end)?;
    serde_json::from_str(span).ok()
}

/// A decoded reply. `parsed` is false when the text held no recognizable
/// plan and `plan` is the one-step `unknown` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedReply {
    pub plan: BatchPlan,
    pub parsed: bool,
}

/// Decode a reply into a plan. Anything that is not a recognizable plan
/// becomes a one-step plan holding an `unknown` action with the raw text.
pub fn decode_reply(raw: &str) -> DecodedReply {
    let body = strip_code_fences(raw);
    let Some(value) = parse_json(body) else {
        return unparsed(raw, "Response was not valid JSON");
    };
    match BatchPlan::from_value(&value) {
        Some(plan) => DecodedReply { plan, parsed: true },
        None => unparsed(raw, "Response JSON has no actions"),
    }
}

fn unparsed(raw: &str, reason: &str) -> DecodedReply {
    DecodedReply {
        plan: unknown_plan(raw, reason),
        parsed: false,
    }
}

fn unknown_plan(raw: &str, reason: &str) -> BatchPlan {
    BatchPlan::new(vec![RawAction::new(
        "unknown",
        serde_json::json!({ "originalText": raw, "reason": reason }),
    )])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_batch_shape() {
        let DecodedReply { plan, parsed } = decode_reply(
            "```json\n{\"actions\": [{\"action\": \"setBpm\", \"parameters\": {\"bpm\": 90}}], \"confidence\": 0.8}\n```",
        );
        assert!(parsed);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.actions[0].action, "setBpm");
        assert_eq!(plan.confidence, Some(0.8));
    }

    #[test]
    fn test_legacy_single_action_shape() {
        let plan = decode_reply("{\"action\": \"play\", \"parameters\": {}, \"reasoning\": \"go\"}").plan;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.actions[0].action, "play");
        assert_eq!(plan.reasoning.as_deref(), Some("go"));
    }

    #[test]
    fn test_json_inside_prose() {
        let plan = decode_reply("Sure! Here you go: {\"actions\": [{\"action\": \"stop\"}]} Enjoy.").plan;
        assert_eq!(plan.actions[0].action, "stop");
    }

    #[test]
    fn test_garbage_becomes_unknown_with_raw_text() {
        let reply = decode_reply("I cannot do that");
        assert!(!reply.parsed);
        assert_eq!(reply.plan.actions[0].parameters["originalText"], "I cannot do that");

        let reply = decode_reply("{\"message\": \"hello\"}");
        assert!(!reply.parsed);
        assert_eq!(reply.plan.actions[0].parameters["reason"], "Response JSON has no actions");
    }

    #[test]
    fn test_model_authored_unknown_is_a_real_plan() {
        let reply = decode_reply(
            "{\"actions\": [{\"action\": \"unknown\", \"parameters\": {\"reason\": \"not music\"}}]}",
        );
        assert!(reply.parsed);
        assert_eq!(reply.plan.actions[0].parameters["reason"], "not music");
    }

    #[test]
    fn test_one_bad_entry_keeps_the_rest() {
        let reply = decode_reply(
            "{\"actions\": [{\"action\": \"setBpm\", \"parameters\": {\"bpm\": 90}}, {\"action\": \"play\"}, \"oops\"]}",
        );
        assert!(reply.parsed);
        let names: Vec<&str> = reply.plan.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(names, vec!["setBpm", "play", "unknown"]);

        let reply = decode_reply("{\"actions\": [{\"action\": \"play\"}], \"sampleChoices\": {\"drums/kick\": null}}");
        assert!(reply.parsed);
        assert_eq!(reply.plan.actions[0].action, "play");
    }
}
