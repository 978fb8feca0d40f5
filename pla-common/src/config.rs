//! Bootstrap configuration and root folder resolution
//!
//! Configuration is bootstrap-only: it is read once at startup and the
//! service must restart to pick up changes.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--config`, `--root-folder`, `--port`)
//! 2. Environment variables (`PLA_CONFIG`, `PLA_ROOT_FOLDER`, `PLA_PORT`)
//! 3. TOML configuration file
//! 4. Compiled defaults (code constants)
//!
//! A missing TOML file is never fatal: the service logs a warning and
//! starts with compiled defaults. A TOML file that exists but does not
//! parse is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "PLA_CONFIG";

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "PLA_ROOT_FOLDER";

/// Default HTTP port for pla-listing
pub const DEFAULT_PORT: u16 = 5740;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "pla.db";

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("pla"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\pla"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("pla"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/pla"))
        } else {
            // ~/.local/share/pla (or /var/lib/pla for system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("pla"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/pla"))
        };

        Self {
            root_folder,
            port: DEFAULT_PORT,
            log_level: default_log_level(),
        }
    }
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the database and other local state
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub latency: LatencyConfig,

    #[serde(default)]
    pub uploads: UploadConfig,

    #[serde(default)]
    pub review: ReviewConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            latency: LatencyConfig::default(),
            uploads: UploadConfig::default(),
            review: ReviewConfig::default(),
            events: EventsConfig::default(),
            sessions: SessionsConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Which listing store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-lifetime map, lost on restart
    #[default]
    Memory,
    /// SQLite database in the root folder
    Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Simulated latencies of the stub backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_enhancement_ms")]
    pub enhancement_ms: u64,
    #[serde(default = "default_save_ms")]
    pub save_ms: u64,
}

impl LatencyConfig {
    /// Zero latency everywhere (tests)
    pub fn none() -> Self {
        Self {
            enhancement_ms: 0,
            save_ms: 0,
        }
    }

    pub fn enhancement(&self) -> Duration {
        Duration::from_millis(self.enhancement_ms)
    }

    pub fn save(&self) -> Duration {
        Duration::from_millis(self.save_ms)
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enhancement_ms: default_enhancement_ms(),
            save_ms: default_save_ms(),
        }
    }
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    /// Most files accepted in one AddFiles request
    #[serde(default = "default_max_files_per_request")]
    pub max_files_per_request: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_files_per_request: default_max_files_per_request(),
        }
    }
}

/// Session retention
///
/// Sessions idle longer than `idle_timeout_secs` are swept every
/// `sweep_interval_secs`. Each registry holds at most `capacity` sessions;
/// inserting beyond that evicts the least recently used one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
}

impl SessionsConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            capacity: default_session_capacity(),
        }
    }
}

/// Review workflow behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Look up saved listings before synthesizing review data.
    ///
    /// Off by default: the review page always shows synthesized data.
    #[serde(default)]
    pub prefer_saved_listings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enhancement_ms() -> u64 {
    1500
}

fn default_save_ms() -> u64 {
    1000
}

fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_files_per_request() -> usize {
    10
}

fn default_event_capacity() -> usize {
    100
}

fn default_idle_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_session_capacity() -> usize {
    1000
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file if one is present, otherwise compiled defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the TOML config file
///
/// CLI argument, then `PLA_CONFIG`, then `<config dir>/pla/<module>.toml`
/// if that file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("pla").join(format!("{}.toml", module_name)))
        .filter(|p| p.exists())
}

/// Resolves the root folder following the settings priority order
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            cli_arg: None,
        }
    }

    /// Root folder given on the command line (highest priority)
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("{}: root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                info!("{}: root folder from {}", self.module_name, ROOT_FOLDER_ENV_VAR);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &config.root_folder {
            info!("{}: root folder from TOML config", self.module_name);
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and derives paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
