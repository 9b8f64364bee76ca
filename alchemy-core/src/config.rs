//! Engine configuration.
//!
//! Everything is picked once when an [`crate::Alchemy`] is built: which store
//! backend to use and how the generator talks to its model.

use crate::error::GeneratorError;
use crate::hint::HintStart;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Which store implementation to construct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local; resolutions are not replay-safe across restarts.
    #[default]
    Memory,
    /// Durable JSON snapshot at the given path.
    JsonFile(PathBuf),
}

/// Configuration for the element generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// API key (read from ANTHROPIC_API_KEY by `from_env`).
    pub api_key: Option<String>,

    /// Model to use.
    pub model: String,

    /// Maximum tokens per reply. Replies are a tiny JSON object.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 100,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GeneratorConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct AlchemyConfig {
    /// Store backend.
    pub store: StoreBackend,

    /// Generator settings.
    pub generator: GeneratorConfig,

    /// Where hint searches start.
    pub hint_start: HintStart,
}

impl AlchemyConfig {
    /// Create a config with defaults (memory store, default model).
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment.
    ///
    /// - `ANTHROPIC_API_KEY`
    /// - `ALCHEMY_STORE_PATH` (selects the JSON file store)
    /// - `ALCHEMY_MODEL`, `ALCHEMY_MAX_TOKENS`, `ALCHEMY_TEMPERATURE`, `ALCHEMY_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, GeneratorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AlchemyConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GeneratorError> {
        let mut config = Self::default();

        if let Some(path) = lookup("ALCHEMY_STORE_PATH").filter(|p| !p.trim().is_empty()) {
            config.store = StoreBackend::JsonFile(PathBuf::from(path));
        }

        let generator = &mut config.generator;
        generator.api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(model) = lookup("ALCHEMY_MODEL") {
            generator.model = model;
        }
        if let Some(raw) = lookup("ALCHEMY_MAX_TOKENS") {
            generator.max_tokens = parse_var("ALCHEMY_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = lookup("ALCHEMY_TEMPERATURE") {
            let temperature: f32 = parse_var("ALCHEMY_TEMPERATURE", &raw)?;
            generator.temperature = temperature.clamp(0.0, 1.0);
        }
        if let Some(raw) = lookup("ALCHEMY_TIMEOUT_SECS") {
            generator.timeout = Duration::from_secs(parse_var("ALCHEMY_TIMEOUT_SECS", &raw)?);
        }

        Ok(config)
    }

    /// Set the store backend.
    pub fn with_store(mut self, store: StoreBackend) -> Self {
        self.store = store;
        self
    }

    /// Set the generator settings.
    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    /// Set where hint searches start.
    pub fn with_hint_start(mut self, hint_start: HintStart) -> Self {
        self.hint_start = hint_start;
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, GeneratorError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| GeneratorError::Config(format!("{key}={raw:?}: {e}")))
}
