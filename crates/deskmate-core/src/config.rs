//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Typed sections fall back to built-in defaults when a key is absent, so an
//! empty working directory still yields a usable [`Settings`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        // `APP_API__BASE_URL` -> `api.base_url`
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Build a config from an explicit figment, bypassing file discovery.
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self {
            figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }

    fn validate(&self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if settings.retrieval.chunk_size == 0 {
            return Err(Error::InvalidConfig("retrieval.chunk_size must be > 0".into()).into());
        }
        if settings.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into()).into());
        }
        if settings.api.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("api.base_url is empty".into()).into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub api: ApiSettings,
    pub models: ModelSettings,
    pub retrieval: RetrievalSettings,
    pub runner: RunnerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub key_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            key_env: "API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ApiSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> crate::Result<String> {
        match env::var(&self.key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => {
                let message = format!("environment variable {} is not set", self.key_env);
                Err(Error::InvalidConfig(message))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    pub chat: String,
    pub notes: String,
    pub answer: String,
    pub rudebot: String,
    pub image: String,
    pub transcribe: String,
    pub embedding: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            chat: "gpt-3.5-turbo".to_string(),
            notes: "gpt-4".to_string(),
            answer: "gpt-4.1".to_string(),
            rudebot: "ft:gpt-3.5-turbo-0125:personal::CaKAw4RI".to_string(),
            image: "dall-e-3".to_string(),
            transcribe: "whisper-1".to_string(),
            embedding: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSettings {
    pub chunk_size: usize,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            top_k: 3,
        }
    }
}

/// What to do with in-flight background tasks when the owner shuts down.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Drop callbacks and let worker threads finish on their own.
    #[default]
    Detach,
    /// Join every worker thread before returning; results are discarded.
    Block,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunnerSettings {
    pub shutdown: ShutdownPolicy,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Turn a file argument into a path anchored at `base` (normally the working
/// directory). Blank input stays empty so page validation can report it.
pub fn resolve_input_path<S: AsRef<str>>(base: &Path, raw: S) -> PathBuf {
    let raw = raw.as_ref().trim();
    if raw.is_empty() {
        return PathBuf::new();
    }
    let path = expand_path(raw);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
