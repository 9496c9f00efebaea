// src/cli.rs

use crate::core::config_loader;
use crate::core::environment::ProcessEnvironment;
use crate::core::module::ModuleExecutor;
use crate::models::{EnvChange, ModuleRequest};
use crate::system::shell::{ShellKind, render_changes};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

/// envmod: run an Environment Modules / LMOD command and print its environment changes.
///
/// A child process cannot change its parent's environment, so the changes are printed
/// as shell statements meant to be evaluated by the calling shell:
///
/// ```sh
/// eval "$(envmod load sems-gcc/7.3.0)"
/// ```
///
/// The exit status is the module status: 0 on success, non-zero on failure.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Shell dialect of the printed statements. Defaults to the config, then the platform.
    #[arg(long, value_enum)]
    pub shell: Option<ShellKind>,

    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Module command to run, skipping discovery.
    #[arg(long, value_name = "PATH")]
    pub modulecmd: Option<PathBuf>,

    /// Do not run the `startup` commands from the configuration.
    #[arg(long)]
    pub no_startup: bool,

    /// The module action (`load`, `unload`, `swap`, `use`, ...).
    pub action: String,

    /// Arguments passed to the action unchanged and in order.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Runs the CLI request, writing the rendered changes to `out`.
/// Returns the module status to exit with.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    // 1. Configuration, with command-line overrides.
    let mut config = config_loader::load_config(cli.config.as_deref())?;
    if let Some(path) = &cli.modulecmd {
        config.modulecmd = Some(path.clone());
    }
    let shell = cli.shell.unwrap_or_else(|| config.shell_or_default());

    // 2. Startup commands first, then the requested one.
    let mut requests = if cli.no_startup {
        Vec::new()
    } else {
        config.startup_requests()?
    };
    requests.push(ModuleRequest::new(cli.action.as_str(), cli.args.clone()));

    // 3. Work on a copy of our environment so every request sees the previous ones.
    let mut env = ProcessEnvironment::snapshot();
    let executor = ModuleExecutor::from_config(&config);
    let outcomes = executor
        .execute_all(&requests, &mut env)
        .context("module command could not be completed")?;

    // 4. Print every applied change, even when a later request failed.
    let changes: Vec<EnvChange> = outcomes
        .iter()
        .flat_map(|outcome| outcome.changes.iter().cloned())
        .collect();
    let rendered = render_changes(&changes, shell)
        .context("module output cannot be printed as shell statements")?;
    out.write_all(rendered.as_bytes())?;
    out.flush()?;

    Ok(outcomes.last().map_or(0, |outcome| outcome.code()))
}
