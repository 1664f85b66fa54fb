//! Single source of truth for structured log event names.
//!
//! Every `tracing` call in the pipeline carries `event = <one of these>`, so
//! a subscriber can filter or count them without matching message text.

pub const SESSION_CREATED: &str = "router:session_created";
pub const SESSION_INVALIDATED: &str = "router:session_invalidated";
pub const RETRY_SCHEDULED: &str = "router:retry_scheduled";
pub const FALLBACK_ENGAGED: &str = "router:fallback_engaged";
pub const CACHE_HIT: &str = "router:cache_hit";
pub const RESPONSE_UNPARSEABLE: &str = "router:response_unparseable";
pub const BATCH_COMPLETED: &str = "executor:batch_completed";
pub const STEP_FAILED: &str = "executor:step_failed";
pub const TRACK_PROVISIONED: &str = "executor:track_provisioned";
pub const PLACEMENT_SHIFTED: &str = "executor:placement_shifted";
pub const SAMPLE_UNRESOLVED: &str = "executor:sample_unresolved";

pub const ALL: &[&str] = &[
    SESSION_CREATED,
    SESSION_INVALIDATED,
    RETRY_SCHEDULED,
    FALLBACK_ENGAGED,
    CACHE_HIT,
    RESPONSE_UNPARSEABLE,
    BATCH_COMPLETED,
    STEP_FAILED,
    TRACK_PROVISIONED,
    PLACEMENT_SHIFTED,
    SAMPLE_UNRESOLVED,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_unique_and_namespaced() {
        let mut seen = std::collections::HashSet::new();
        for name in ALL {
            assert!(seen.insert(*name), "duplicate event {name}");
            let (scope, rest) = name.split_once(':').unwrap_or(("", ""));
            assert!(matches!(scope, "router" | "executor"), "{name}");
            assert!(!rest.is_empty(), "{name}");
        }
    }
}
