#![allow(clippy::needless_pass_by_value)]

use std::fmt::Write;

use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

use super::command::{Command, CommandFamily, CommandInfo};

/// A registry entry: metadata + JSON schema for the params.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRegistryEntry {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
    pub description: &'static str,
    pub family: CommandFamily,
    pub undoable: bool,
    pub llm_hidden: bool,
    pub param_schema: Value,
}

pub(super) fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub(super) fn schema_value<T: schemars::JsonSchema>() -> Value {
    let root = schema_for!(T);
    serde_json::to_value(root).unwrap_or(empty_object_schema())
}

pub(super) fn entry(
    info: CommandInfo,
    aliases: &[&'static str],
    param_schema: Value,
) -> CommandRegistryEntry {
    CommandRegistryEntry {
        name: info.name,
        aliases: aliases.to_vec(),
        description: info.description,
        family: info.family,
        undoable: info.undoable,
        llm_hidden: info.llm_hidden,
        param_schema,
    }
}

/// Decode action parameters. A missing or `null` parameter bag decodes as `{}`.
pub(super) fn de<T: serde::de::DeserializeOwned>(input: &Value) -> Result<T, String> {
    let input = match input {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(input).map_err(|e| e.to_string())
}

/// The complete command registry, auto-generated from param struct schemas.
pub fn command_registry() -> Vec<CommandRegistryEntry> {
    Command::registry_entries()
}

/// `name*` for required parameters, `name` for optional ones.
fn param_summary(schema: &Value) -> String {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return String::new();
    };
    props
        .keys()
        .map(|k| {
            if required.contains(&k.as_str()) {
                format!("{k}*")
            } else {
                k.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compact command reference for the model's system prompt, grouped by family.
pub fn prompt_reference() -> String {
    let registry = command_registry();
    let mut out = String::new();
    for family in CommandFamily::all() {
        let entries: Vec<&CommandRegistryEntry> = registry
            .iter()
            .filter(|e| e.family == *family && !e.llm_hidden)
            .collect();
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {} ({})", family.slug(), family.description());
        for e in entries {
            let params = param_summary(&e.param_schema);
            if params.is_empty() {
                let _ = writeln!(out, "- {}: {}", e.name, e.description);
            } else {
                let _ = writeln!(out, "- {}({params}): {}", e.name, e.description);
            }
        }
        out.push('\n');
    }
    out
}

/// Generate JSON Schema formatted tool list.
pub fn to_json_schema() -> Value {
    Value::Array(
        command_registry()
            .iter()
            .filter(|e| !e.llm_hidden)
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "description": e.description,
                    "family": e.family,
                    "undoable": e.undoable,
                    "inputSchema": e.param_schema,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_family() {
        let registry = command_registry();
        for family in CommandFamily::all() {
            assert!(registry.iter().any(|e| e.family == *family), "{family:?}");
        }
        assert!(registry.len() >= 30);
    }

    #[test]
    fn test_schemas_use_wire_field_names() {
        let registry = command_registry();
        let add_note = registry.iter().find(|e| e.name == "addNote").unwrap();
        let props = add_note.param_schema["properties"].as_object().unwrap();
        assert!(props.contains_key("pitch"));
        assert!(props.contains_key("startTick"));
        assert!(props.contains_key("patternId"));
    }

    #[test]
    fn test_prompt_reference_hides_unknown() {
        let text = prompt_reference();
        assert!(text.contains("- setBpm(bpm*)"));
        assert!(text.contains("- play:"));
        assert!(text.contains("clarificationNeeded"));
        assert!(!text.contains("- unknown"));
    }

    #[test]
    fn test_null_params_decode_as_empty_object() {
        let p: crate::commands::params::AddPlaylistTrackParams = de(&Value::Null).unwrap();
        assert!(p.name.is_none());
    }
}
