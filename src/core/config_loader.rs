// src/core/config_loader.rs

//! # Config Loader
//!
//! Reads the optional `config.toml`:
//!
//! ```toml
//! # Path to the module command; skips discovery when set. `~` and `$VAR` are expanded.
//! modulecmd = "$MODULESHOME/libexec/modulecmd.tcl"
//! # Copy the module tool's stderr to ours (default: true).
//! echo_stderr = true
//! # Dialect printed by the `envmod` binary: "sh", "cmd" or "powershell".
//! shell = "sh"
//! # Module commands run before every `envmod` invocation.
//! startup = ["use ~/modulefiles", "load sems-env"]
//! ```
//!
//! A missing file at the default location yields the defaults. A missing file that was
//! asked for explicitly is an error.

use crate::constants::CONFIG_PATH_VAR;
use crate::core::paths::{self, PathError};
use crate::models::ModuleRequest;
use crate::system::shell::ShellKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Configuration file '{0}' does not exist.")]
    NotFound(String),
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid startup command '{0}'.")]
    InvalidStartup(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    pub modulecmd: Option<PathBuf>,
    pub echo_stderr: bool,
    pub shell: Option<ShellKind>,
    pub startup: Vec<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            modulecmd: None,
            echo_stderr: true,
            shell: None,
            startup: Vec::new(),
        }
    }
}

impl ModuleConfig {
    /// Parses TOML text and expands `modulecmd`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        if let Some(raw) = &config.modulecmd {
            config.modulecmd = Some(paths::expand_path_template(&raw.to_string_lossy())?);
        }
        Ok(config)
    }

    /// The shell to render for: the configured one or the platform default.
    pub fn shell_or_default(&self) -> ShellKind {
        self.shell.unwrap_or_else(ShellKind::platform_default)
    }

    /// Parses each `startup` line into a request, expanding `~` and `$VAR` in its arguments.
    pub fn startup_requests(&self) -> Result<Vec<ModuleRequest>, ConfigError> {
        self.startup
            .iter()
            .map(|line| -> Result<ModuleRequest, ConfigError> {
                let mut request = ModuleRequest::from_command_line(line)
                    .ok_or_else(|| ConfigError::InvalidStartup(line.clone()))?;
                request.args = request
                    .args
                    .iter()
                    .map(|arg| paths::expand_str(arg))
                    .collect::<Result<Vec<String>, PathError>>()?;
                Ok(request)
            })
            .collect()
    }
}

/// Loads the configuration.
///
/// Lookup order: `explicit`, then `$ENVMOD_CONFIG`, then `<config dir>/envmod/config.toml`.
/// Only the last one may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<ModuleConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }
    if let Some(path) = env::var_os(CONFIG_PATH_VAR).filter(|v| !v.is_empty()) {
        return load_config_from(Path::new(&path));
    }

    let default_path = paths::get_default_config_path()?;
    if !default_path.exists() {
        log::debug!(
            "No config file at '{}'; using defaults.",
            default_path.display()
        );
        return Ok(ModuleConfig::default());
    }
    load_config_from(&default_path)
}

/// Loads the configuration from `path`, which must exist.
pub fn load_config_from(path: &Path) -> Result<ModuleConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::debug!("Loaded config from '{}'", path.display());
    ModuleConfig::from_toml_str(&content)
}
