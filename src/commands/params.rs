use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A pattern or channel reference as written by the model.
///
/// The sentinel string `"current"` (any case) becomes [`Ref::LastCreated`]
/// at decode time, so nothing downstream compares against magic strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Ref {
    Explicit(String),
    #[default]
    LastCreated,
}

impl Ref {
    pub fn explicit(id: impl Into<String>) -> Self {
        Ref::Explicit(id.into())
    }
}

impl Serialize for Ref {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ref::Explicit(id) => serializer.serialize_str(id),
            Ref::LastCreated => serializer.serialize_str("current"),
        }
    }
}

impl<'de> Deserialize<'de> for Ref {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(Ref::LastCreated),
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty()
                    || trimmed.eq_ignore_ascii_case("current")
                    || trimmed.eq_ignore_ascii_case("latest")
                    || trimmed.eq_ignore_ascii_case("last")
                {
                    Ok(Ref::LastCreated)
                } else {
                    Ok(Ref::Explicit(trimmed.to_string()))
                }
            }
            serde_json::Value::Number(n) => Ok(Ref::Explicit(n.to_string())),
            other => Err(D::Error::custom(format!("expected an id string, got {other}"))),
        }
    }
}

impl JsonSchema for Ref {
    fn schema_name() -> String {
        "Ref".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

/// Tolerant decoders for model-produced parameter values.
///
/// Numbers may arrive as JSON numbers or numeric strings; booleans as
/// `true`/`"on"`/`1`. Anything else is a decode error, which the parser
/// turns into an `Unknown` command.
pub mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|x| x.is_finite())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn integer(v: &Value) -> Option<i64> {
        if let Some(i) = v.as_i64() {
            return Some(i);
        }
        number(v).map(|x| x.round() as i64)
    }

    fn boolean(v: &Value) -> Option<bool> {
        match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|x| x.abs() > f64::EPSILON),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(true),
                "false" | "off" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = Value::deserialize(d)?;
        number(&v).ok_or_else(|| D::Error::custom(format!("expected a number, got {v}")))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            v => number(&v)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a number, got {v}"))),
        }
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let v = Value::deserialize(d)?;
        integer(&v).ok_or_else(|| D::Error::custom(format!("expected an integer, got {v}")))
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            v => integer(&v)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {v}"))),
        }
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            v => boolean(&v)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected a boolean, got {v}"))),
        }
    }

    /// Ids sometimes come back as bare numbers.
    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.trim().to_string())),
            Value::Number(n) => Ok(Some(n.to_string())),
            v => Err(D::Error::custom(format!("expected an id, got {v}"))),
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        opt_id(d)?.ok_or_else(|| D::Error::custom("id must not be empty"))
    }
}

fn default_pattern_name() -> String {
    "Pattern".to_string()
}

fn default_pattern_length() -> i64 {
    16
}

fn default_velocity() -> i64 {
    100
}

fn default_note_duration() -> i64 {
    24
}

fn default_sample_duration() -> i64 {
    96
}

fn default_true() -> Option<bool> {
    Some(true)
}

/// Which sample a step wants: a category query, optionally pinned to a
/// concrete id. The batch executor fills `sample_id` from the batch's
/// sample choice table before the step runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SampleSpec {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "type", alias = "sound")]
    pub subcategory: Option<String>,
    #[serde(
        default,
        alias = "sample",
        alias = "sample_id",
        deserialize_with = "lenient::opt_id"
    )]
    pub sample_id: Option<String>,
}

impl SampleSpec {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.subcategory.is_none() && self.sample_id.is_none()
    }

    /// Human-readable query used in error messages.
    pub fn describe(&self) -> String {
        match (&self.sample_id, &self.category, &self.subcategory) {
            (Some(id), _, _) => id.clone(),
            (None, Some(c), Some(s)) => format!("{c}/{s}"),
            (None, Some(c), None) => c.clone(),
            (None, None, Some(s)) => s.clone(),
            (None, None, None) => "(no sample query)".to_string(),
        }
    }
}

// ── Pattern params ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPatternParams {
    #[serde(default = "default_pattern_name", alias = "patternName")]
    pub name: String,
    /// Length in sixteenth-note steps.
    #[serde(
        default = "default_pattern_length",
        alias = "length",
        alias = "steps",
        alias = "length_steps",
        deserialize_with = "lenient::i64"
    )]
    pub length_steps: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatternRefParams {
    #[serde(alias = "id", alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
}

// ── Note params ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteParams {
    #[serde(alias = "note", alias = "midi", deserialize_with = "lenient::i64")]
    pub pitch: i64,
    #[serde(default = "default_velocity", alias = "vel", deserialize_with = "lenient::i64")]
    pub velocity: i64,
    #[serde(
        default,
        alias = "tick",
        alias = "start",
        alias = "start_tick",
        deserialize_with = "lenient::i64"
    )]
    pub start_tick: i64,
    #[serde(
        default = "default_note_duration",
        alias = "length",
        alias = "durationTicks",
        deserialize_with = "lenient::i64"
    )]
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteParams {
    #[serde(default, alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
    #[serde(flatten)]
    pub note: NoteParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddNotesParams {
    #[serde(default, alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
    #[serde(alias = "sequence")]
    pub notes: Vec<NoteParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteParams {
    #[serde(default, alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
    #[serde(alias = "id", alias = "note_id", deserialize_with = "lenient::id")]
    pub note_id: String,
    #[serde(default, alias = "note", deserialize_with = "lenient::opt_i64")]
    pub pitch: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub velocity: Option<i64>,
    #[serde(
        default,
        alias = "tick",
        alias = "start",
        deserialize_with = "lenient::opt_i64"
    )]
    pub start_tick: Option<i64>,
    #[serde(default, alias = "length", deserialize_with = "lenient::opt_i64")]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNoteParams {
    #[serde(default, alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
    #[serde(alias = "id", alias = "note_id", deserialize_with = "lenient::id")]
    pub note_id: String,
}

// ── Transport params ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetBpmParams {
    #[serde(alias = "tempo", alias = "value", deserialize_with = "lenient::f64")]
    pub bpm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPositionParams {
    #[serde(
        alias = "position",
        alias = "startTick",
        alias = "start_tick",
        deserialize_with = "lenient::i64"
    )]
    pub tick: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleMetronomeParams {
    /// Omit to flip the current state.
    #[serde(default, alias = "on", alias = "value", deserialize_with = "lenient::opt_bool")]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetLoopRegionParams {
    #[serde(alias = "start", alias = "start_tick", deserialize_with = "lenient::i64")]
    pub start_tick: i64,
    #[serde(alias = "end", alias = "end_tick", deserialize_with = "lenient::i64")]
    pub end_tick: i64,
}

// ── Channel params ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddChannelParams {
    #[serde(default, alias = "channelName")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub sample: SampleSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelParams {
    #[serde(default, alias = "channel", alias = "channel_id")]
    pub channel_id: Ref,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pan: Option<f64>,
    #[serde(default, alias = "mute", deserialize_with = "lenient::opt_bool")]
    pub muted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRefParams {
    #[serde(alias = "id", alias = "channel", alias = "channel_id")]
    pub channel_id: Ref,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadSampleParams {
    #[serde(default, alias = "channel", alias = "channel_id")]
    pub channel_id: Ref,
    #[serde(flatten)]
    pub sample: SampleSpec,
}

// ── Mixer params ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetVolumeParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(alias = "value", alias = "level", deserialize_with = "lenient::f64")]
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPanParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(alias = "value", deserialize_with = "lenient::f64")]
    pub pan: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetMuteParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(
        default = "default_true",
        alias = "mute",
        alias = "value",
        deserialize_with = "lenient::opt_bool"
    )]
    pub muted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetSoloParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(default = "default_true", alias = "value", deserialize_with = "lenient::opt_bool")]
    pub solo: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetMasterVolumeParams {
    #[serde(alias = "value", alias = "level", deserialize_with = "lenient::f64")]
    pub volume: f64,
}

// ── Playlist params ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPlaylistTrackParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddClipParams {
    #[serde(default, alias = "pattern", alias = "pattern_id")]
    pub pattern_id: Ref,
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(
        default,
        alias = "tick",
        alias = "start",
        alias = "start_tick",
        alias = "position",
        deserialize_with = "lenient::i64"
    )]
    pub start_tick: i64,
    /// Defaults to the pattern's own length.
    #[serde(
        default,
        alias = "length",
        alias = "duration",
        alias = "length_ticks",
        deserialize_with = "lenient::opt_i64"
    )]
    pub length_ticks: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSampleParams {
    #[serde(flatten)]
    pub sample: SampleSpec,
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(
        default,
        alias = "tick",
        alias = "start",
        alias = "start_tick",
        alias = "position",
        deserialize_with = "lenient::i64"
    )]
    pub start_tick: i64,
    #[serde(
        default = "default_sample_duration",
        alias = "length",
        alias = "lengthTicks",
        deserialize_with = "lenient::i64"
    )]
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveClipParams {
    #[serde(alias = "id", alias = "clip", alias = "clip_id", deserialize_with = "lenient::id")]
    pub clip_id: String,
    #[serde(
        default,
        alias = "track",
        alias = "track_index",
        deserialize_with = "lenient::opt_i64"
    )]
    pub track_index: Option<i64>,
    #[serde(
        alias = "tick",
        alias = "start",
        alias = "start_tick",
        alias = "position",
        deserialize_with = "lenient::i64"
    )]
    pub start_tick: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResizeClipParams {
    #[serde(alias = "id", alias = "clip", alias = "clip_id", deserialize_with = "lenient::id")]
    pub clip_id: String,
    #[serde(
        alias = "length",
        alias = "duration",
        alias = "length_ticks",
        deserialize_with = "lenient::i64"
    )]
    pub length_ticks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipRefParams {
    #[serde(alias = "id", alias = "clip", alias = "clip_id", deserialize_with = "lenient::id")]
    pub clip_id: String,
}

// ── Effect params ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    /// Effect name, e.g. `reverb` or `lowpass`.
    #[serde(alias = "type", alias = "effectType", alias = "key", alias = "name")]
    pub effect: String,
    #[serde(
        default,
        alias = "amount",
        alias = "mix",
        alias = "cutoff",
        deserialize_with = "lenient::opt_f64"
    )]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEffectParams {
    #[serde(alias = "track", alias = "track_index", deserialize_with = "lenient::i64")]
    pub track_index: i64,
    #[serde(alias = "type", alias = "effectType", alias = "key", alias = "name")]
    pub effect: String,
}

// ── Sentinels ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationParams {
    #[serde(alias = "message", alias = "prompt")]
    pub question: String,
    #[serde(default, alias = "choices")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnknownParams {
    /// The raw input that could not be understood.
    #[serde(default, alias = "context", alias = "raw")]
    pub original_text: String,
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ref_current_becomes_last_created() {
        let p: PatternRefParams = serde_json::from_value(json!({"patternId": "CURRENT"})).unwrap();
        assert_eq!(p.pattern_id, Ref::LastCreated);
        let p: PatternRefParams = serde_json::from_value(json!({"id": "pattern-3"})).unwrap();
        assert_eq!(p.pattern_id, Ref::explicit("pattern-3"));
    }

    #[test]
    fn test_absent_pattern_ref_defaults_to_last_created() {
        let p: AddNoteParams = serde_json::from_value(json!({"pitch": 60})).unwrap();
        assert_eq!(p.pattern_id, Ref::LastCreated);
        assert_eq!(p.note.velocity, 100);
        assert_eq!(p.note.duration, 24);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let p: SetBpmParams = serde_json::from_value(json!({"tempo": "128"})).unwrap();
        assert!((p.bpm - 128.0).abs() < f64::EPSILON);
        let p: AddNoteParams =
            serde_json::from_value(json!({"note": "64", "tick": 48.0, "length": "96"})).unwrap();
        assert_eq!(p.note.pitch, 64);
        assert_eq!(p.note.start_tick, 48);
        assert_eq!(p.note.duration, 96);
    }

    #[test]
    fn test_garbage_numbers_fail_decode() {
        assert!(serde_json::from_value::<SetBpmParams>(json!({"bpm": "fast"})).is_err());
        assert!(serde_json::from_value::<SetBpmParams>(json!({})).is_err());
    }

    #[test]
    fn test_sample_spec_flattens_into_params() {
        let p: AddSampleParams = serde_json::from_value(
            json!({"category": "drums", "subcategory": "kick", "track": "2", "startTick": 96}),
        )
        .unwrap();
        assert_eq!(p.sample.category.as_deref(), Some("drums"));
        assert_eq!(p.sample.subcategory.as_deref(), Some("kick"));
        assert!(p.sample.sample_id.is_none());
        assert_eq!(p.track_index, 2);
        assert_eq!(p.duration, 96);
        assert_eq!(p.sample.describe(), "drums/kick");
    }

    #[test]
    fn test_lenient_bools() {
        let p: SetMuteParams = serde_json::from_value(json!({"track": 1})).unwrap();
        assert_eq!(p.muted, Some(true));
        let p: SetMuteParams = serde_json::from_value(json!({"track": 1, "mute": "off"})).unwrap();
        assert_eq!(p.muted, Some(false));
        let p: ToggleMetronomeParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.enabled, None);
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let p: DeleteNoteParams =
            serde_json::from_value(json!({"patternId": 7, "noteId": 12})).unwrap();
        assert_eq!(p.pattern_id, Ref::explicit("7"));
        assert_eq!(p.note_id, "12");
    }
}
