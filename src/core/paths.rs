// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref ENVMOD_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Failed to expand path template '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// Returns the envmod configuration directory (`~/.config/envmod` on Linux).
///
/// Memoized: the first call computes the path, later calls return the cached value.
/// The directory is not created; envmod only ever reads from it.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = ENVMOD_CONFIG_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Default location of `config.toml`.
pub fn get_default_config_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands `~` and `$VAR` / `${VAR}` in a path template.
pub fn expand_path_template(template: &str) -> Result<PathBuf, PathError> {
    expand_str(template).map(PathBuf::from)
}

/// Expands `~` and environment variables in an arbitrary string.
pub fn expand_str(template: &str) -> Result<String, PathError> {
    shellexpand::full(template)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| PathError::Expansion {
            template: template.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_is_memoized() {
        if let Ok(first) = get_config_dir() {
            assert!(first.ends_with(CONFIG_DIR_NAME));
            assert_eq!(get_config_dir().unwrap(), first);
        }
    }

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(
            expand_path_template("/usr/bin/modulecmd").unwrap(),
            PathBuf::from("/usr/bin/modulecmd")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path_template("~/modulefiles").unwrap(), home.join("modulefiles"));
        }
    }

    #[test]
    fn undefined_variables_are_errors() {
        let err = expand_str("$__ENVMOD_SURELY_UNDEFINED__/bin").unwrap_err();
        assert!(matches!(err, PathError::Expansion { .. }));
    }
}
