//! Wire shape of a model response: an ordered list of raw actions.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::commands::params::lenient;

/// One untyped `{action, parameters}` entry as produced by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawAction {
    #[serde(default, deserialize_with = "action_name")]
    pub action: String,
    #[serde(default, alias = "params", alias = "args")]
    #[ts(type = "Record<string, unknown>")]
    pub parameters: Value,
}

impl RawAction {
    pub fn new(action: impl Into<String>, parameters: Value) -> Self {
        Self {
            action: action.into(),
            parameters,
        }
    }
}

/// Accept a non-string action rather than failing the whole plan; the
/// parser then reports it as unrecognized.
fn action_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Where a plan came from. Lets callers see when the model was bypassed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum PlanSource {
    #[default]
    Model,
    Cache,
    Fallback,
}

/// An ordered set of raw actions derived from one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", from = "WirePlan")]
#[ts(export)]
pub struct BatchPlan {
    pub actions: Vec<RawAction>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
    /// Pre-bound `category[/subcategory]` → sample id choices, usually the
    /// `sampleChoices` of a previous batch passed back for determinism.
    #[ts(type = "Record<string, string>")]
    pub sample_choices: IndexMap<String, String>,
    pub source: PlanSource,
}

/// Accepts both the batch shape (`actions: [...]`) and the legacy
/// single-action shape (`action` + `parameters` at the top level).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlan {
    #[serde(default)]
    actions: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "legacy_action")]
    action: Option<String>,
    #[serde(default, alias = "params")]
    parameters: Value,
    #[serde(default, deserialize_with = "loose_confidence")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "loose_text")]
    reasoning: Option<String>,
    #[serde(default, deserialize_with = "loose_choices")]
    sample_choices: IndexMap<String, String>,
    #[serde(default, deserialize_with = "loose_source")]
    source: PlanSource,
}

fn legacy_action<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    action_name(d).map(|s| Some(s).filter(|s| !s.is_empty()))
}

fn loose_confidence<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(lenient::opt_f64(Value::deserialize(d)?).ok().flatten())
}

fn loose_source<'de, D: Deserializer<'de>>(d: D) -> Result<PlanSource, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

fn loose_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Keep the string (or numeric) ids and drop every other entry.
fn loose_choices<'de, D: Deserializer<'de>>(d: D) -> Result<IndexMap<String, String>, D::Error> {
    let Value::Object(map) = Value::deserialize(d)? else {
        return Ok(IndexMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, id)| match id {
            Value::String(s) if !s.trim().is_empty() => Some((key, s.trim().to_string())),
            Value::Number(n) => Some((key, n.to_string())),
            _ => None,
        })
        .collect())
}

/// One `actions` entry. Anything that is not an action object becomes an
/// `unknown` step holding the raw text, so its neighbours still run.
fn raw_action(entry: Value) -> RawAction {
    let original = entry.to_string();
    let reason = if entry.is_object() {
        "Action entry could not be decoded"
    } else {
        "Action entry is not an object"
    };
    if entry.is_object() {
        if let Ok(action) = serde_json::from_value::<RawAction>(entry) {
            return action;
        }
    }
    RawAction::new(
        "unknown",
        serde_json::json!({ "originalText": original, "reason": reason }),
    )
}

impl From<WirePlan> for BatchPlan {
    fn from(w: WirePlan) -> Self {
        let actions = match (w.actions, w.action) {
            (Some(actions), _) => actions.into_iter().map(raw_action).collect(),
            (None, Some(action)) => vec![RawAction::new(action, w.parameters)],
            (None, None) => Vec::new(),
        };
        BatchPlan {
            actions,
            confidence: w.confidence.map(|c| c.clamp(0.0, 1.0)),
            reasoning: w.reasoning.filter(|r| !r.trim().is_empty()),
            sample_choices: w.sample_choices,
            source: w.source,
        }
    }
}

impl BatchPlan {
    pub fn new(actions: Vec<RawAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: PlanSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Decode a model payload. `None` unless it is an object carrying either
    /// an `actions` array or a top-level `action`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let has_batch = obj.get("actions").is_some_and(Value::is_array);
        let has_single = obj.get("action").is_some_and(|a| !a.is_null());
        if !has_batch && !has_single {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
