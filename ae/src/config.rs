//! AutoEvolver configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main AutoEvolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Oracle provider configuration
    pub llm: LlmConfig,

    /// Decomposition engine tuning
    pub planning: PlanningConfig,

    /// Where the capability document lives
    pub capabilities: CapabilitiesConfig,

    /// Session log persistence
    pub session: SessionConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Fails fast when no oracle credential is available, so a session is
    /// never constructed without one.
    pub fn validate(&self) -> Result<()> {
        self.llm.get_api_key().map(|_| ())
    }

    /// Load configuration with fallback chain
    ///
    /// `--config PATH` > `./.autoevolver.yml` > `~/.config/autoevolver/autoevolver.yml` > defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".autoevolver.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => std::iter::once(PathBuf::from(".autoevolver.yml"))
                .chain(Self::user_config_path())
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("autoevolver").join("autoevolver.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Oracle provider configuration
///
/// The credential is threaded explicitly into client constructors; nothing
/// here is process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// File containing the API key, used when the environment variable is unset
    #[serde(rename = "api-key-file", skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures (network, 408, 429, 5xx)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key_file: None,
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 2048,
            timeout_ms: 120_000,
            max_retries: 3,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: environment variable first, then key file
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, "LlmConfig::get_api_key: called");
        if let Ok(key) = std::env::var(&self.api_key_env)
            && !key.trim().is_empty()
        {
            return Ok(key.trim().to_string());
        }

        if let Some(path) = &self.api_key_file {
            let path = expand_home(path);
            let key = fs::read_to_string(&path).context(format!("Failed to read API key file {}", path.display()))?;
            let key = key.trim();
            if !key.is_empty() {
                return Ok(key.to_string());
            }
            return Err(eyre::eyre!("API key file {} is empty", path.display()));
        }

        Err(eyre::eyre!(
            "LLM API key not found. Set the {} environment variable or api-key-file in your config.",
            self.api_key_env
        ))
    }
}

/// Decomposition engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Bound on recursive subdivision passes; absent means unbounded
    #[serde(rename = "max-subdivision-passes", skip_serializing_if = "Option::is_none")]
    pub max_subdivision_passes: Option<u32>,

    /// Stricter re-asks after a malformed classification reply
    #[serde(rename = "classify-retries")]
    pub classify_retries: u32,

    /// Maximum tokens requested per planning prompt
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            max_subdivision_passes: None,
            classify_retries: 1,
            max_tokens: 1024,
        }
    }
}

/// Location of the capability document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    /// Directory searched (recursively) for the document
    pub dir: PathBuf,

    /// Document file name
    pub file: String,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("documents"),
            file: "abilities.txt".to_string(),
        }
    }
}

/// Session log persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory for per-session JSON logs
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("log"),
        }
    }
}

impl SessionConfig {
    /// The log directory, with relative paths taken under `root`
    pub fn log_dir_under(&self, root: &Path) -> PathBuf {
        let dir = expand_home(&self.log_dir);
        if dir.is_absolute() { dir } else { root.join(dir) }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
