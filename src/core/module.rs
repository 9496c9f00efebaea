// src/core/module.rs

//! # Module Executor
//!
//! Runs one module action end to end:
//!
//! 1. Locate the module command executable ([`Locator`]).
//! 2. Run it in python mode through a [`ModuleRunner`] and capture its output.
//! 3. Parse stdout into a mutation script and apply it to an [`EnvironmentTarget`].
//! 4. Classify the result from exit code, stderr and `_mlstatus`.
//!
//! The executor keeps no state between calls.

use crate::core::config_loader::ModuleConfig;
use crate::core::environment::{EnvironmentSource, EnvironmentTarget, ProcessEnvironment};
use crate::core::locator::{Locator, ToolNotFound};
use crate::core::script::{self, Script, ScriptError, Statement};
use crate::core::status::{self, MissingStatus};
use crate::models::{EnvChange, ModuleArgs, ModuleOutcome, ModuleRequest};
use crate::system::executor::{ExecutionError, ModuleRunner, ProcessRunner};
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error(transparent)]
    ToolNotFound(#[from] ToolNotFound),
    #[error("No module action specified.")]
    EmptyAction,
    #[error(transparent)]
    Spawn(#[from] ExecutionError),
    #[error("Module command '{program}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        program: String,
        #[source]
        source: FromUtf8Error,
    },
    #[error("Module command produced output that could not be interpreted: {0}")]
    MalformedOutput(#[from] ScriptError),
    /// The mutation script raised an exception of its own.
    #[error("{kind}: {message}")]
    ScriptRaised { kind: String, message: String },
    #[error(transparent)]
    MissingStatus(#[from] MissingStatus),
}

impl ModuleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound(_))
    }

    /// True for the type-mismatch family: a script raising `TypeError`, or a tool
    /// returning no status where one was expected.
    pub fn is_type_error(&self) -> bool {
        match self {
            Self::ScriptRaised { kind, .. } => kind == "TypeError",
            Self::MissingStatus(_) => true,
            _ => false,
        }
    }

    /// The exception class named by a raising script.
    pub fn raised_kind(&self) -> Option<&str> {
        match self {
            Self::ScriptRaised { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Runs module actions against an environment.
#[derive(Debug, Clone)]
pub struct ModuleExecutor<R = ProcessRunner> {
    locator: Locator,
    runner: R,
    echo_stderr: bool,
}

impl ModuleExecutor<ProcessRunner> {
    /// Default discovery, real processes, tool stderr echoed.
    pub fn new() -> Self {
        Self::with_runner(Locator::new(), ProcessRunner)
    }

    pub fn from_config(config: &ModuleConfig) -> Self {
        let locator = match &config.modulecmd {
            Some(path) => Locator::with_explicit(path),
            None => Locator::new(),
        };
        Self::with_runner(locator, ProcessRunner).echo_stderr(config.echo_stderr)
    }
}

impl Default for ModuleExecutor<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ModuleRunner> ModuleExecutor<R> {
    pub fn with_runner(locator: Locator, runner: R) -> Self {
        Self {
            locator,
            runner,
            echo_stderr: true,
        }
    }

    /// Whether the tool's stderr is copied to this process's stderr.
    /// It is always kept in [`ModuleOutcome::stderr`].
    pub fn echo_stderr(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }

    /// Runs `request` and applies its changes to `env`.
    ///
    /// A failed module operation is not an error: it is an outcome with a non-zero
    /// status. Errors are reserved for a missing tool, output that cannot be
    /// interpreted, and scripts that raise.
    pub fn execute<E>(&self, request: &ModuleRequest, env: &mut E) -> Result<ModuleOutcome, ModuleError>
    where
        E: EnvironmentTarget + EnvironmentSource,
    {
        if request.action.is_empty() {
            return Err(ModuleError::EmptyAction);
        }

        // 1. Locate.
        let tool = self.locator.locate(&*env)?;

        // 2. Run.
        let child_env = env.child_env();
        let result = self.runner.run(&tool, request, child_env.as_ref())?;
        let stderr = result.stderr_text();
        if self.echo_stderr && !stderr.is_empty() {
            eprint!("{}", stderr);
        }

        // 3. Parse and apply.
        let stdout = String::from_utf8(result.stdout).map_err(|e| ModuleError::InvalidUtf8Output {
            program: tool.program.display().to_string(),
            source: e,
        })?;
        let script = script::parse(&stdout)?;
        let changes = apply_script(&script, env)?;

        // 4. Classify.
        let script_status = script.ml_status();
        let module_status = status::classify(result.exit_code, &stderr, script_status)?;
        let stderr_status = status::scan_ml_status(&stderr);
        let ml_status = if stderr_status.is_present() {
            stderr_status
        } else {
            script_status
        };

        if module_status.is_success() {
            log::debug!("module {} succeeded ({} change(s))", request, changes.len());
        } else {
            log::warn!(
                "module {} failed with status {} (exit code {:?})",
                request,
                module_status.code(),
                result.exit_code
            );
        }

        Ok(ModuleOutcome {
            status: module_status,
            changes,
            stderr,
            ml_status,
            flavor: tool.flavor,
        })
    }

    /// Runs every request in order, stopping at the first error or failed status.
    pub fn execute_all<E>(&self, requests: &[ModuleRequest], env: &mut E) -> Result<Vec<ModuleOutcome>, ModuleError>
    where
        E: EnvironmentTarget + EnvironmentSource,
    {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.execute(request, env)?;
            let failed = !outcome.status.is_success();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        Ok(outcomes)
    }
}

/// Applies statements in order. A `raise` stops application; changes made before
/// it stay applied.
fn apply_script<E>(script: &Script, env: &mut E) -> Result<Vec<EnvChange>, ModuleError>
where
    E: EnvironmentTarget + ?Sized,
{
    let mut changes = Vec::new();
    for statement in script.statements() {
        let change = match statement {
            Statement::SetEnv { name, value } => EnvChange::Set {
                name: name.clone(),
                value: value.clone(),
            },
            Statement::UnsetEnv { name } => EnvChange::Unset { name: name.clone() },
            Statement::Assign { .. } => continue,
            Statement::Raise { kind, message } => {
                log::warn!("Module output raised {}: {}", kind, message);
                return Err(ModuleError::ScriptRaised {
                    kind: kind.clone(),
                    message: message.clone(),
                });
            }
        };
        env.apply(&change);
        changes.push(change);
    }
    Ok(changes)
}

/// Runs `module <action> <args...>` against the current process environment.
///
/// Returns `0` on success and a non-zero status on failure.
///
/// ```no_run
/// envmod::module("load", "sems-gcc/4.8.4")?;
/// envmod::module("swap", ["sems-gcc/4.8.4", "sems-gcc/7.3.0"])?;
/// # Ok::<(), envmod::ModuleError>(())
/// ```
pub fn module(action: &str, args: impl Into<ModuleArgs>) -> Result<i32, ModuleError> {
    run_in_process(&ModuleRequest::new(action, args))
}

/// Like [`module`], with the action as the first element of `argv`.
pub fn module_argv<I, S>(argv: I) -> Result<i32, ModuleError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let request = ModuleRequest::from_argv(argv).ok_or(ModuleError::EmptyAction)?;
    run_in_process(&request)
}

fn run_in_process(request: &ModuleRequest) -> Result<i32, ModuleError> {
    let outcome = ModuleExecutor::new().execute(request, &mut ProcessEnvironment)?;
    Ok(outcome.code())
}
