// Configuration loading and parsing (config/hrcombo.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::group::GroupSize;

/// File name of the engine configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "hrcombo.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Immutable engine configuration. Built once at startup and passed by
/// reference into every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data: DataPaths,
    pub output: OutputConfig,
    pub groups: GroupsConfig,
    pub limits: LimitsConfig,
    pub scan: ScanConfig,
}

// ---------------------------------------------------------------------------
// hrcombo.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire hrcombo.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    data: DataPaths,
    output: OutputConfig,
    groups: GroupsConfig,
    #[serde(default)]
    limits: LimitsConfig,
    #[serde(default)]
    scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataPaths {
    /// Root of the per-day game-data tree (searched recursively).
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    pub dir: String,
    pub latest_file: String,
    /// Also write `hr_combinations_<timestamp>.json` next to the latest file.
    #[serde(default = "default_true")]
    pub timestamped_copies: bool,
}

/// Per-size filtering and memory policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GroupPolicy {
    /// Minimum number of distinct days a combination must appear on.
    pub min_occurrences: usize,
    /// Output size cap. `None` keeps every surviving combination.
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Hard cap on subsets emitted for a single day.
    pub max_subsets_per_day: usize,
    /// Cap on distinct keys tracked during aggregation. Once reached, new
    /// keys are dropped while existing keys keep accumulating.
    #[serde(default)]
    pub max_tracked_keys: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GroupsConfig {
    pub pairs: GroupPolicy,
    pub trios: GroupPolicy,
    pub quads: GroupPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct LimitsConfig {
    /// Circuit breaker: stop ingesting days once this many subsets have been
    /// emitted for one group size.
    #[serde(default)]
    pub max_total_subsets: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ScanConfig {
    /// Only process the most recent N day files.
    #[serde(default)]
    pub recent_days: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl GroupsConfig {
    /// Policy for one group size.
    pub fn policy(&self, size: GroupSize) -> &GroupPolicy {
        match size {
            GroupSize::Pairs => &self.pairs,
            GroupSize::Trios => &self.trios,
            GroupSize::Quads => &self.quads,
        }
    }
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            pairs: GroupPolicy {
                min_occurrences: 2,
                max_results: Some(2000),
                max_subsets_per_day: 8000,
                max_tracked_keys: Some(100_000),
            },
            trios: GroupPolicy {
                min_occurrences: 2,
                max_results: Some(1000),
                max_subsets_per_day: 3000,
                max_tracked_keys: Some(50_000),
            },
            quads: GroupPolicy {
                min_occurrences: 1,
                max_results: Some(500),
                max_subsets_per_day: 1000,
                max_tracked_keys: Some(10_000),
            },
        }
    }
}

impl Config {
    /// Configuration with built-in defaults rooted at `data_root`, writing
    /// into `output_dir`. Used by tests and as a fallback for ad-hoc runs.
    pub fn with_defaults(data_root: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            data: DataPaths {
                root: data_root.into(),
            },
            output: OutputConfig {
                dir: output_dir.into(),
                latest_file: "hr_combinations_latest.json".into(),
                timestamped_copies: false,
            },
            groups: GroupsConfig::default(),
            limits: LimitsConfig::default(),
            scan: ScanConfig::default(),
        }
    }

    /// Full path of the "latest" snapshot file.
    pub fn latest_path(&self) -> PathBuf {
        Path::new(&self.output.dir).join(&self.output.latest_file)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/hrcombo.toml` relative to
/// `base_dir`.
///
/// Does not seed from `defaults/`; see [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate configuration text. `origin` is only used in errors.
pub fn parse_config(text: &str, origin: &Path) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: origin.to_path_buf(),
        source: e,
    })?;

    let config = Config {
        data: file.data,
        output: file.output,
        groups: file.groups,
        limits: file.limits,
        scan: file.scan,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/hrcombo.toml` from `defaults/hrcombo.toml` when it is
/// missing. Returns the path written, or `None` when the config already
/// exists. An existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.is_file() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {} in config/ or defaults/ under {}",
                CONFIG_FILE,
                base_dir.display()
            ),
        });
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    info!("seeded {} from {}", target.display(), source.display());
    Ok(Some(target))
}

/// Load `config/hrcombo.toml` under the working directory, seeding it from
/// the shipped defaults on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadError {
        path: PathBuf::from("."),
        source: e,
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check cross-field constraints. Called after parsing and again by callers
/// that apply command-line overrides.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.root.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.root".into(),
            message: "must not be empty".into(),
        });
    }

    if config.output.latest_file.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "output.latest_file".into(),
            message: "must not be empty".into(),
        });
    }

    for size in GroupSize::ALL {
        let policy = config.groups.policy(size);
        let section = match size {
            GroupSize::Pairs => "groups.pairs",
            GroupSize::Trios => "groups.trios",
            GroupSize::Quads => "groups.quads",
        };

        if policy.min_occurrences == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("{section}.min_occurrences"),
                message: "must be >= 1".into(),
            });
        }
        if policy.max_subsets_per_day == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("{section}.max_subsets_per_day"),
                message: "must be > 0".into(),
            });
        }
        if policy.max_results == Some(0) {
            return Err(ConfigError::ValidationError {
                field: format!("{section}.max_results"),
                message: "must be > 0 (omit the key for unbounded output)".into(),
            });
        }
        if policy.max_tracked_keys == Some(0) {
            return Err(ConfigError::ValidationError {
                field: format!("{section}.max_tracked_keys"),
                message: "must be > 0 (omit the key for no cap)".into(),
            });
        }
    }

    if config.limits.max_total_subsets == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "limits.max_total_subsets".into(),
            message: "must be > 0 (omit the key for no cap)".into(),
        });
    }

    if config.scan.recent_days == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "scan.recent_days".into(),
            message: "must be > 0 (omit the key to scan every file)".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
