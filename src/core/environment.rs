// src/core/environment.rs

use crate::models::EnvChange;
use std::collections::HashMap;
use std::env;

/// Something module mutations can be applied to.
pub trait EnvironmentTarget {
    fn set(&mut self, name: &str, value: &str);
    fn unset(&mut self, name: &str);

    /// Applies a recorded change.
    fn apply(&mut self, change: &EnvChange) {
        match change {
            EnvChange::Set { name, value } => self.set(name, value),
            EnvChange::Unset { name } => self.unset(name),
        }
    }
}

/// The environment of the running process.
///
/// The process environment is shared, unsynchronised state. Callers that run
/// module operations while other threads read or write the environment are
/// responsible for ordering those accesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl ProcessEnvironment {
    pub fn new() -> Self {
        Self
    }

    /// A snapshot of the current process environment, skipping non-UTF-8 entries.
    pub fn snapshot() -> HashMap<String, String> {
        env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

#[allow(unsafe_code)]
impl EnvironmentTarget for ProcessEnvironment {
    fn set(&mut self, name: &str, value: &str) {
        log::trace!("setenv {}={}", name, value);
        // SAFETY: this crate performs no concurrent environment access of its own; the
        // caller owns ordering against other threads, as documented on the type.
        unsafe { env::set_var(name, value) };
    }

    fn unset(&mut self, name: &str) {
        log::trace!("unsetenv {}", name);
        // SAFETY: see `set`.
        unsafe { env::remove_var(name) };
    }
}

impl EnvironmentTarget for HashMap<String, String> {
    fn set(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }

    fn unset(&mut self, name: &str) {
        self.remove(name);
    }
}

/// Reads variables from some environment source. Used by tool discovery so that
/// lookups can be served from a map in tests.
pub trait EnvironmentSource {
    fn var(&self, name: &str) -> Option<String>;

    /// The complete environment a module tool should be spawned with, or `None`
    /// to let it inherit the environment of this process.
    fn child_env(&self) -> Option<HashMap<String, String>> {
        None
    }
}

impl EnvironmentSource for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvironmentSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn child_env(&self) -> Option<HashMap<String, String>> {
        Some(self.clone())
    }
}
