// src/core/locator.rs

use crate::constants::{LMOD_CMD_VAR, MODULES_CMD_VAR, MODULESHOME_VAR, PATH_CANDIDATES, PATH_VAR};
use crate::core::environment::EnvironmentSource;
use crate::models::{ModuleFlavor, ModuleTool};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// No module command executable could be found. Fatal; never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("FileNotFoundError: no module command executable found (searched: {})", searched.join(", "))]
pub struct ToolNotFound {
    /// Every location that was considered, in search order.
    pub searched: Vec<String>,
}

/// Finds the module command executable.
///
/// Search order:
/// 1. An explicitly configured path. When set, nothing else is searched.
/// 2. `MODULES_CMD` (Environment Modules 4+), then `LMOD_CMD`.
/// 3. Well-known locations under `MODULESHOME`.
/// 4. `modulecmd`, `modulecmd.tcl` and `lmod` on `PATH`.
///
/// Empty variables are treated as unset.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    explicit: Option<PathBuf>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `path` and only `path`.
    pub fn with_explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit: Some(path.into()),
        }
    }

    pub fn locate(&self, env: &dyn EnvironmentSource) -> Result<ModuleTool, ToolNotFound> {
        let mut searched = Vec::new();

        // 1. Explicit configuration.
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Ok(found(path, ModuleFlavor::from_program(path)));
            }
            return Err(ToolNotFound {
                searched: vec![path.display().to_string()],
            });
        }

        // 2. Variables pointing straight at the executable.
        for (var, flavor) in [
            (MODULES_CMD_VAR, ModuleFlavor::EnvironmentModules),
            (LMOD_CMD_VAR, ModuleFlavor::Lmod),
        ] {
            match non_empty_var(env, var) {
                Some(value) => {
                    let path = PathBuf::from(&value);
                    if path.is_file() {
                        return Ok(found(&path, flavor));
                    }
                    searched.push(format!("${}={}", var, value));
                }
                None => searched.push(format!("${}", var)),
            }
        }

        // 3. Install prefix.
        match non_empty_var(env, MODULESHOME_VAR) {
            Some(home) => {
                let home = PathBuf::from(home);
                for (relative, flavor) in [
                    ("bin/modulecmd", ModuleFlavor::EnvironmentModules),
                    ("libexec/modulecmd.tcl", ModuleFlavor::EnvironmentModules),
                    ("libexec/lmod", ModuleFlavor::Lmod),
                ] {
                    let candidate = home.join(relative);
                    if candidate.is_file() {
                        return Ok(found(&candidate, flavor));
                    }
                    searched.push(candidate.display().to_string());
                }
            }
            None => searched.push(format!("${}", MODULESHOME_VAR)),
        }

        // 4. PATH lookup.
        if let Some(path_var) = non_empty_var(env, PATH_VAR) {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            for name in PATH_CANDIDATES {
                match which::which_in(name, Some(&path_var), &cwd) {
                    Ok(path) => return Ok(found(&path, ModuleFlavor::from_program(&path))),
                    Err(e) => log::trace!("'{}' not on PATH: {}", name, e),
                }
            }
        }
        searched.extend(PATH_CANDIDATES.iter().map(|name| format!("{} on $PATH", name)));

        log::debug!("Module command lookup failed; searched {:?}", searched);
        Err(ToolNotFound { searched })
    }
}

fn non_empty_var(env: &dyn EnvironmentSource, name: &str) -> Option<String> {
    env.var(name).filter(|value| !value.trim().is_empty())
}

fn found(path: &Path, flavor: ModuleFlavor) -> ModuleTool {
    let program = dunce::simplified(path).to_path_buf();
    log::debug!("Using {} module command at '{}'", flavor, program.display());
    ModuleTool { program, flavor }
}
