use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::storage::{atomic_write, read_json, write_json, StorageError};

// ── LLM provider types ──────────────────────────────────────────

/// Which upstream API the model router talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub enum LlmProvider {
    Anthropic,
    OpenAiCompatible,
}

/// Capability tier requested by the caller. Each tier maps to a concrete
/// model name per provider and owns its own upstream session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ModelTier {
    Fast,
    #[default]
    Standard,
    Advanced,
}

impl ModelTier {
    pub fn all() -> &'static [ModelTier] {
        &[Self::Fast, Self::Standard, Self::Advanced]
    }

    pub fn default_model(self, provider: LlmProvider) -> &'static str {
        match (provider, self) {
            (LlmProvider::Anthropic, ModelTier::Fast) => "claude-3-5-haiku-latest",
            (LlmProvider::Anthropic, ModelTier::Standard) => "claude-sonnet-4-20250514",
            (LlmProvider::Anthropic, ModelTier::Advanced) => "claude-opus-4-20250514",
            (LlmProvider::OpenAiCompatible, ModelTier::Fast) => "gpt-4o-mini",
            (LlmProvider::OpenAiCompatible, ModelTier::Standard) => "gpt-4o",
            (LlmProvider::OpenAiCompatible, ModelTier::Advanced) => "o1",
        }
    }
}

/// Per-tier model overrides. `None` = provider default for that tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierModels {
    #[serde(default)]
    pub fast: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub advanced: Option<String>,
}

/// Full configuration for the chosen LLM provider.
///
/// The `api_key` field is never written to `settings.json`. It is stored in a
/// separate credentials file and loaded/saved via [`load_api_key`]/[`save_api_key`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for OpenAI-compatible providers (ignored for Anthropic).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub models: TierModels,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            api_key: None,
            base_url: None,
            models: TierModels::default(),
        }
    }
}

impl LlmProviderConfig {
    pub fn model_for(&self, tier: ModelTier) -> String {
        let configured = match tier {
            ModelTier::Fast => &self.models.fast,
            ModelTier::Standard => &self.models.standard,
            ModelTier::Advanced => &self.models.advanced,
        };
        configured
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| tier.default_model(self.provider))
            .to_string()
    }
}

/// Redacted view of the LLM config safe to hand to a UI (no raw API key).
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct LlmConfigInfo {
    pub provider: LlmProvider,
    pub has_api_key: bool,
    pub base_url: Option<String>,
    pub models: TierModels,
}

impl LlmConfigInfo {
    #[must_use]
    pub fn from_config(config: &LlmProviderConfig) -> Self {
        Self {
            provider: config.provider,
            has_api_key: config.api_key.as_ref().is_some_and(|k| !k.is_empty()),
            base_url: config.base_url.clone(),
            models: config.models.clone(),
        }
    }
}

// ── Pipeline settings ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RouterSettings {
    /// Additional attempts after the first failed model call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before retry `n` is `n * base_delay_ms`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Model plans remembered per router. 0 disables the cache.
    #[serde(default = "default_response_cache_size")]
    pub response_cache_size: usize,
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_response_cache_size() -> usize {
    32
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            response_cache_size: default_response_cache_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExecutorSettings {
    /// Write one JSONL line per executed step under `batch-logs/`.
    #[serde(default = "default_true")]
    pub audit: bool,
    /// Auto-provisioning never grows the playlist past this many tracks.
    #[serde(default = "default_max_playlist_tracks")]
    pub max_playlist_tracks: usize,
    /// Fixed seed for sample selection. `None` = fresh entropy per batch.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub rng_seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_max_playlist_tracks() -> usize {
    64
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            audit: true,
            max_playlist_tracks: default_max_playlist_tracks(),
            rng_seed: None,
        }
    }
}

// ── App settings ─────────────────────────────────────────────────

/// Settings stored in the caller's config directory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppSettings {
    pub version: u32,
    #[serde(default)]
    pub llm: LlmProviderConfig,
    #[serde(default)]
    pub router: RouterSettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
}

const SETTINGS_VERSION: u32 = 1;

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            llm: LlmProviderConfig::default(),
            router: RouterSettings::default(),
            executor: ExecutorSettings::default(),
        }
    }
}

/// Load the API key from the separate credentials file.
pub fn load_api_key(app_config_dir: &Path) -> Option<String> {
    let path = crate::paths::credentials_path(app_config_dir);
    std::fs::read_to_string(path)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Save the API key to the separate credentials file (atomic write).
/// An empty key deletes the file.
pub fn save_api_key(app_config_dir: &Path, key: &str) -> Result<(), StorageError> {
    std::fs::create_dir_all(app_config_dir)?;
    let path = crate::paths::credentials_path(app_config_dir);
    if key.is_empty() {
        let _ = std::fs::remove_file(&path);
    } else {
        atomic_write(&path, key.as_bytes())?;
    }
    Ok(())
}

fn env_api_key() -> Option<String> {
    std::env::var(crate::paths::API_KEY_ENV)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Load settings from the config directory. Returns None if no settings file exists.
///
/// The API key is filled from the credentials file, then from the
/// `VIBE_BEATS_API_KEY` environment variable.
pub fn load_settings(app_config_dir: &Path) -> Option<AppSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    let mut settings = read_json::<AppSettings>(&path).ok()?;
    if settings.llm.api_key.is_none() {
        settings.llm.api_key = load_api_key(app_config_dir).or_else(env_api_key);
    }
    Some(settings)
}

/// Save settings to the config directory. A key present on `settings.llm`
/// goes to the credentials file, never into `settings.json`.
pub fn save_settings(app_config_dir: &Path, settings: &AppSettings) -> Result<(), StorageError> {
    std::fs::create_dir_all(app_config_dir)?;
    if let Some(key) = settings.llm.api_key.as_deref() {
        save_api_key(app_config_dir, key)?;
    }
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn fresh_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("vibe_beats_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = fresh_dir("settings");
        let mut settings = AppSettings::default();
        settings.router.max_retries = 4;
        settings.executor.rng_seed = Some(42);
        save_settings(&dir, &settings).unwrap();

        let loaded = load_settings(&dir).expect("should load");
        assert_eq!(loaded.router.max_retries, 4);
        assert_eq!(loaded.executor.rng_seed, Some(42));
        assert!(matches!(loaded.llm.provider, LlmProvider::Anthropic));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_api_key_never_written_to_settings_file() {
        let dir = fresh_dir("credentials");
        let mut settings = AppSettings::default();
        settings.llm.api_key = Some("sk-test-key".into());
        save_settings(&dir, &settings).unwrap();

        let raw = std::fs::read_to_string(crate::paths::settings_path(&dir)).unwrap();
        assert!(!raw.contains("sk-test-key"));
        assert_eq!(load_api_key(&dir).as_deref(), Some("sk-test-key"));
        let loaded = load_settings(&dir).unwrap();
        assert_eq!(loaded.llm.api_key.as_deref(), Some("sk-test-key"));

        save_api_key(&dir, "").unwrap();
        assert!(load_api_key(&dir).is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = fresh_dir("partial");
        std::fs::write(
            crate::paths::settings_path(&dir),
            r#"{"version": 1, "router": {"base_delay_ms": 10}}"#,
        )
        .unwrap();
        let loaded = load_settings(&dir).unwrap();
        assert_eq!(loaded.router.base_delay_ms, 10);
        assert_eq!(loaded.router.max_retries, 2);
        assert_eq!(loaded.router.response_cache_size, 32);
        assert_eq!(loaded.executor.max_playlist_tracks, 64);
        assert!(loaded.executor.audit);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_tier_models_fall_back_to_provider_defaults() {
        let mut config = LlmProviderConfig::default();
        assert_eq!(config.model_for(ModelTier::Standard), "claude-sonnet-4-20250514");
        config.models.fast = Some("my-fast-model".into());
        assert_eq!(config.model_for(ModelTier::Fast), "my-fast-model");
        config.provider = LlmProvider::OpenAiCompatible;
        assert_eq!(config.model_for(ModelTier::Standard), "gpt-4o");
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = std::env::temp_dir().join("vibe_beats_test_no_settings");
        let _ = std::fs::remove_dir_all(&dir);
        assert!(load_settings(&dir).is_none());
    }

    #[test]
    fn test_redacted_info() {
        let mut config = LlmProviderConfig::default();
        assert!(!LlmConfigInfo::from_config(&config).has_api_key);
        config.api_key = Some("k".into());
        assert!(LlmConfigInfo::from_config(&config).has_api_key);
    }
}
