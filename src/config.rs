use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::memory::AppendOptions;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HabitatConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub completion: CompletionConfig,
    pub chat: ChatConfig,
    pub personas: PersonaConfig,
    pub handshake: HandshakeConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Habitat root; streams and profiles live under `memory/`.
    pub root_dir: String,
    pub root_stream: String,
    pub vexis_stream: String,
    pub profile: String,
    /// Take an exclusive file lock around each append (for multi-process writers).
    pub lock_appends: bool,
    pub sync_appends: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    /// When false, personas answer with a local stub instead of calling the model.
    pub enabled: bool,
    pub model: String,
    pub api_url: String,
    /// Literal API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Identity assumed when a request names no user.
    pub default_user: String,
    pub max_turns: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersonaConfig {
    pub cipher_prompt: String,
    pub vexis_prompt: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Consent string a handshake's purpose token must carry.
    pub consent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_habitat_dir().to_string_lossy().into_owned(),
            root_stream: "memory/streams/root_memory.jsonl".into(),
            vexis_stream: "memory/streams/vexis_memory.jsonl".into(),
            profile: "memory/profiles/cipher_profile.json".into(),
            lock_appends: false,
            sync_appends: false,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4.1-mini".into(),
            api_url: "https://api.openai.com/v1/chat/completions".into(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 60,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_user: "operator".into(),
            max_turns: 6,
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            cipher_prompt: "You are Cipher, a calm, practical AI coworker running in a local \
                            habitat. You see a short transcript of recent messages from the \
                            local memory stream."
                .into(),
            vexis_prompt: "You are Vexis, a sharp, risk-focused AI co-analyst running in a \
                           local habitat. You see a short transcript of your recent \
                           conversation from the local memory stream."
                .into(),
        }
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            consent: "operator".into(),
        }
    }
}

/// Returns `~/.habitat/`
pub fn default_habitat_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".habitat")
}

/// Returns the default config file path: `~/.habitat/config.toml`
pub fn default_config_path() -> PathBuf {
    default_habitat_dir().join("config.toml")
}

impl HabitatConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            HabitatConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (HABITAT_ROOT, HABITAT_LOG_LEVEL, HABITAT_MODEL, HABITAT_PORT).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HABITAT_ROOT") {
            self.storage.root_dir = val;
        }
        if let Ok(val) = std::env::var("HABITAT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("HABITAT_MODEL") {
            self.completion.model = val;
        }
        if let Ok(val) = std::env::var("HABITAT_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid HABITAT_PORT"),
            }
        }
    }

    /// Resolve the habitat root, expanding `~` if needed.
    pub fn resolved_root(&self) -> PathBuf {
        expand_tilde(&self.storage.root_dir)
    }

    pub fn root_stream_path(&self) -> PathBuf {
        self.resolve(&self.storage.root_stream)
    }

    pub fn vexis_stream_path(&self) -> PathBuf {
        self.resolve(&self.storage.vexis_stream)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.resolve(&self.storage.profile)
    }

    pub fn append_options(&self) -> AppendOptions {
        AppendOptions {
            lock: self.storage.lock_appends,
            sync: self.storage.sync_appends,
        }
    }

    /// API key from config, else from the configured environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.completion
            .api_key
            .clone()
            .or_else(|| std::env::var(&self.completion.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }

    /// Relative paths hang off the habitat root; absolute and `~/` paths stand alone.
    fn resolve(&self, path: &str) -> PathBuf {
        let expanded = expand_tilde(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.resolved_root().join(expanded)
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
