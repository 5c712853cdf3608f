use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

use crate::runner::AgentSettings;

const DEFAULT_BACKOFF_MS: u64 = 1;
const DEFAULT_OUTPUT_DIR: &str = ".";

/// Root game configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GameConfig {
    pub players: usize,
    pub pack: PathBuf,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Configuration with defaults for everything but the table itself.
    pub fn new(players: usize, pack: impl Into<PathBuf>) -> Self {
        Self {
            players,
            pack: pack.into(),
            outputs: OutputsConfig::default(),
            agent: AgentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: GameConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        if self.players == 0 {
            return Err(ValidationError::InvalidField {
                field: "players".to_string(),
                message: "number of players must be greater than 0".to_string(),
            });
        }
        if self.pack.as_os_str().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "pack".to_string(),
                message: "pack path must not be empty".to_string(),
            });
        }
        self.outputs.validate()?;
        self.agent.validate()?;
        self.logging.normalize();
        Ok(())
    }

    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            dir: PathBuf::from(&self.outputs.dir),
            summary_json: self.outputs.summary_json.as_ref().map(PathBuf::from),
        }
    }
}

/// Where player and deck files are written.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default)]
    pub summary_json: Option<String>,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            summary_json: None,
        }
    }
}

impl OutputsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.dir.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.dir".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        if self
            .summary_json
            .as_ref()
            .is_some_and(|path| path.trim().is_empty())
        {
            return Err(ValidationError::InvalidField {
                field: "outputs.summary_json".to_string(),
                message: "path must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Pacing of the player agents.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Pause after finding the source deck empty, taken with no lock held.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Optional pause after every completed turn.
    #[serde(default)]
    pub turn_delay_ms: u64,
    /// Halts the game once any agent has completed this many turns.
    #[serde(default)]
    pub max_turns: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backoff_ms: DEFAULT_BACKOFF_MS,
            turn_delay_ms: 0,
            max_turns: None,
        }
    }
}

impl AgentConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.backoff_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "agent.backoff_ms".to_string(),
                message: "backoff must be at least 1ms".to_string(),
            });
        }
        if self.max_turns == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "agent.max_turns".to_string(),
                message: "turn limit must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn settings(&self) -> AgentSettings {
        AgentSettings {
            backoff: Duration::from_millis(self.backoff_ms),
            turn_delay: Duration::from_millis(self.turn_delay_ms),
            max_turns: self.max_turns,
        }
    }
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

/// Structured JSON logs are off by default; plain logs go to stderr.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub dir: PathBuf,
    pub summary_json: Option<PathBuf>,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
