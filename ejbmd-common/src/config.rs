//! Configuration loading and resolution
//!
//! Bootstrap settings come from a small TOML file. Each setting resolves in
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: the resolver logs a warning and
//! continues with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

pub const ENV_ON_ERROR: &str = "EJBMD_CUSTOM_BINDINGS_ON_ERROR";
pub const ENV_RUNTIME_VERSION: &str = "EJBMD_RUNTIME_VERSION";
pub const ENV_SFSB_FAILOVER: &str = "EJBMD_SFSB_FAILOVER";

/// What to do when a custom binding fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OnError {
    /// Log a warning and drop the offending value
    #[default]
    Warn,
    /// Fail the deployment
    Fail,
    /// Drop the offending value, log at debug only
    Ignore,
}

impl FromStr for OnError {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WARN" => Ok(OnError::Warn),
            "FAIL" => Ok(OnError::Fail),
            "IGNORE" => Ok(OnError::Ignore),
            other => Err(Error::Config(format!(
                "invalid custom bindings on-error value '{}' (expected WARN, FAIL or IGNORE)",
                other
            ))),
        }
    }
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OnError::Warn => "WARN",
            OnError::Fail => "FAIL",
            OnError::Ignore => "IGNORE",
        };
        f.write_str(s)
    }
}

/// EJB runtime level the module is deployed on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuntimeVersion {
    #[serde(rename = "3.1")]
    V3_1,
    #[default]
    #[serde(rename = "3.2")]
    V3_2,
}

impl RuntimeVersion {
    /// Before 3.2 an empty `Local`/`Remote` marker still adds the single
    /// implemented interface when another view already exists.
    pub fn empty_annotation_ignores_explicit_interfaces(self) -> bool {
        self < RuntimeVersion::V3_2
    }

    /// `passivationCapable` on the stateful annotation exists from 3.2.
    pub fn honors_passivation_capable_annotation(self) -> bool {
        self >= RuntimeVersion::V3_2
    }
}

impl FromStr for RuntimeVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3.0" | "3.1" => Ok(RuntimeVersion::V3_1),
            "3.2" | "4.0" => Ok(RuntimeVersion::V3_2),
            other => Err(Error::Config(format!("unsupported runtime version '{}'", other))),
        }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeVersion::V3_1 => f.write_str("3.1"),
            RuntimeVersion::V3_2 => f.write_str("3.2"),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Severity policy for custom binding violations
    #[serde(default)]
    pub custom_bindings_on_error: OnError,

    #[serde(default)]
    pub runtime_version: RuntimeVersion,

    /// Whether stateful session failover is enabled
    #[serde(default)]
    pub sfsb_failover: bool,

    /// Discover `@ManagedBean` classes
    #[serde(default = "default_managed_beans")]
    pub managed_beans: bool,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            custom_bindings_on_error: OnError::default(),
            runtime_version: RuntimeVersion::default(),
            sfsb_failover: false,
            managed_beans: default_managed_beans(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

fn default_log_level() -> String {
    "info".to_string()
}

fn default_managed_beans() -> bool {
    true
}

/// Parse a TOML config file.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Default configuration file path for the platform, if one exists
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ejbmd").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/ejbmd/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub on_error: Option<OnError>,
    pub runtime_version: Option<RuntimeVersion>,
    pub sfsb_failover: Option<bool>,
}

/// Resolves the effective configuration across all four tiers
pub struct ConfigResolver {
    cli: CliOverrides,
}

impl ConfigResolver {
    pub fn new(cli: CliOverrides) -> Self {
        Self { cli }
    }

    /// Build the effective configuration.
    ///
    /// Only an explicitly named config file that fails to load, or an
    /// environment variable with an invalid value, is an error.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.cli.config_path {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path() {
                Some(path) => match load_toml_config(&path) {
                    Ok(config) => {
                        debug!("Loaded configuration from {}", path.display());
                        config
                    }
                    Err(e) => {
                        warn!("Ignoring unreadable config file: {}", e);
                        TomlConfig::default()
                    }
                },
                None => {
                    debug!("No config file found, using compiled defaults");
                    TomlConfig::default()
                }
            },
        };

        if let Ok(value) = std::env::var(ENV_ON_ERROR) {
            config.custom_bindings_on_error = value.parse()?;
        }
        if let Ok(value) = std::env::var(ENV_RUNTIME_VERSION) {
            config.runtime_version = value.parse()?;
        }
        if let Ok(value) = std::env::var(ENV_SFSB_FAILOVER) {
            config.sfsb_failover = parse_bool(ENV_SFSB_FAILOVER, &value)?;
        }

        if let Some(on_error) = self.cli.on_error {
            config.custom_bindings_on_error = on_error;
        }
        if let Some(version) = self.cli.runtime_version {
            config.runtime_version = version;
        }
        if let Some(failover) = self.cli.sfsb_failover {
            config.sfsb_failover = failover;
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{}: invalid boolean '{}'", name, other))),
    }
}
