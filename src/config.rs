//! Service configuration.
//!
//! Settings are layered file → environment → CLI. The file is
//! `confsearch.toml`; a missing file yields the defaults below.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! debug = false
//!
//! [search]
//! search_limit = 20
//! prompt_limit = 3000
//! max_query_len = 100
//! embedding_model = "text-embedding-ada-002"
//! index_name = "conf-ada-002"
//!
//! [completion]
//! model = "gpt-3.5-turbo"
//! temperature = 0.2
//! max_answer_tokens = 500
//!
//! [metrics]
//! namespace = ""
//! ```
//!
//! The config is built once in `main` and shared behind an `Arc`; nothing
//! reads it through globals.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ConfigError;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "confsearch.toml";

pub const ENV_DEBUG: &str = "DEBUG";
pub const ENV_METRIC_NAMESPACE: &str = "METRIC_NAMESPACE";
pub const ENV_PROMPT_LIMIT: &str = "PROMPT_LIMIT";
pub const ENV_SEARCH_LIMIT: &str = "SEARCH_LIMIT";
pub const ENV_PORT: &str = "CONFSEARCH_PORT";

const DEFAULT_ROLE: &str = "You are an apostle of the Church of Jesus Christ of Latter-day Saints";
const DEFAULT_PREAMBLE: &str = "Answer the question as truthfully as possible using the provided context, \
and if answer is not contained within the text below, say \"Sorry, I don't know\".\n\n";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enables permissive CORS for local front-end development
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

/// Retrieval and prompt-budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Number of passages requested from the index
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Prompt budget in characters
    #[serde(default = "default_prompt_limit")]
    pub prompt_limit: i64,
    /// Longest accepted query, in characters
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
}

fn default_search_limit() -> usize {
    20
}

fn default_prompt_limit() -> i64 {
    3000
}

fn default_max_query_len() -> usize {
    100
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_index_name() -> String {
    "conf-ada-002".to_string()
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            prompt_limit: default_prompt_limit(),
            max_query_len: default_max_query_len(),
            embedding_model: default_embedding_model(),
            index_name: default_index_name(),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_answer_tokens")]
    pub max_answer_tokens: u32,
    /// System message sent alongside the prompt
    #[serde(default = "default_role")]
    pub role: String,
    /// Instruction text placed before the context section
    #[serde(default = "default_preamble")]
    pub preamble: String,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_answer_tokens() -> u32 {
    500
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn default_preamble() -> String {
    DEFAULT_PREAMBLE.to_string()
}

impl Default for CompletionSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_answer_tokens: default_max_answer_tokens(),
            role: default_role(),
            preamble: default_preamble(),
        }
    }
}

/// Per-request metrics. An empty namespace disables recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSection {
    #[serde(default)]
    pub namespace: String,
}

/// Complete confsearch.toml contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub completion: CompletionSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from `path`, or return defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize confsearch.toml")
    }

    /// Apply process environment overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.server.debug = debug.eq_ignore_ascii_case("true");
        }
        if let Some(namespace) = lookup(ENV_METRIC_NAMESPACE) {
            self.metrics.namespace = namespace;
        }
        if let Some(limit) = lookup(ENV_PROMPT_LIMIT) {
            self.search.prompt_limit = parse_var(ENV_PROMPT_LIMIT, &limit)?;
        }
        if let Some(limit) = lookup(ENV_SEARCH_LIMIT) {
            self.search.search_limit = parse_var(ENV_SEARCH_LIMIT, &limit)?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = parse_var(ENV_PORT, &port)?;
        }
        Ok(())
    }

    /// Apply command-line overrides, which take precedence over everything else.
    pub fn apply_cli(&mut self, port: Option<u16>, prompt_limit: Option<i64>) {
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(limit) = prompt_limit {
            self.search.prompt_limit = limit;
        }
    }

    pub fn metrics_enabled(&self) -> bool {
        !self.metrics.namespace.is_empty()
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.search.prompt_limit <= 0 {
            warnings.push(format!(
                "prompt_limit is {}: no passages will ever be included",
                self.search.prompt_limit
            ));
        }
        if self.search.search_limit == 0 {
            warnings.push("search_limit is 0: the index will never return passages".to_string());
        }
        if self.search.max_query_len == 0 {
            warnings.push("max_query_len is 0: every query will be rejected".to_string());
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            warnings.push(format!(
                "temperature {} is outside the range 0.0-2.0",
                self.completion.temperature
            ));
        }
        if self.completion.preamble.trim().is_empty() && self.completion.role.trim().is_empty() {
            warnings.push("Both role and preamble are empty: the model gets no instructions".to_string());
        }

        warnings
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has invalid value '{}'", key, value)))
}
