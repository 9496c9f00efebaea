// src/system/shell.rs

use crate::models::EnvChange;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use thiserror::Error;

/// Shell dialect used to render environment changes for `eval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// POSIX shells (sh, bash, zsh).
    Sh,
    /// Windows `cmd.exe`.
    Cmd,
    /// PowerShell.
    Powershell,
}

impl ShellKind {
    /// `cmd` on Windows, `sh` everywhere else.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Self::Cmd
        } else {
            Self::Sh
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("Refusing to render variable name {name:?} for {shell}.")]
    UnsafeName { name: String, shell: ShellKind },
    #[error("Refusing to render the value of '{name}' for {shell}: it cannot be quoted safely.")]
    UnsafeValue { name: String, shell: ShellKind },
}

lazy_static! {
    static ref PORTABLE_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex");
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sh => write!(f, "sh"),
            Self::Cmd => write!(f, "cmd"),
            Self::Powershell => write!(f, "powershell"),
        }
    }
}

/// Escapes a value for a `cmd.exe` `set "KEY=VALUE"` command.
/// The surrounding quotes already neutralise `& < > | ^`; only `%` expands.
fn escape_for_cmd_set(value: &str) -> String {
    value.replace('%', "%%")
}

/// Doubles every quote character PowerShell accepts as a single quote.
fn escape_for_powershell(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            escaped.push(c);
        }
        escaped.push(c);
    }
    escaped
}

/// Checks that `change` can be written for `shell` without its text being read as code.
fn check_renderable(change: &EnvChange, shell: ShellKind) -> Result<(), ShellError> {
    let name = change.name();
    let name_ok = match shell {
        ShellKind::Sh | ShellKind::Powershell => PORTABLE_NAME_RE.is_match(name),
        ShellKind::Cmd => !name.is_empty() && !name.contains(['"', '%', '=']) && !name.contains(char::is_control),
    };
    if !name_ok {
        return Err(ShellError::UnsafeName {
            name: name.to_string(),
            shell,
        });
    }

    // A quote or line break inside `set "..."` would end the statement early.
    if let (ShellKind::Cmd, EnvChange::Set { value, .. }) = (shell, change) {
        if value.contains(['"', '\n', '\r']) {
            return Err(ShellError::UnsafeValue {
                name: name.to_string(),
                shell,
            });
        }
    }
    Ok(())
}

/// Renders applied changes, in order, as statements for `shell`.
///
/// Fails without rendering anything if one of the changes cannot be expressed safely,
/// since the output is meant to be evaluated.
pub fn render_changes(changes: &[EnvChange], shell: ShellKind) -> Result<String, ShellError> {
    for change in changes {
        check_renderable(change, shell)?;
    }

    let mut script = String::new();
    if shell == ShellKind::Cmd && !changes.is_empty() {
        script.push_str("@echo off\n");
    }

    for change in changes {
        // Writing into a String cannot fail.
        let _ = match (shell, change) {
            (ShellKind::Sh, EnvChange::Set { name, value }) => {
                writeln!(script, "export {}='{}'", name, value.replace('\'', "'\\''"))
            }
            (ShellKind::Sh, EnvChange::Unset { name }) => writeln!(script, "unset {}", name),
            (ShellKind::Cmd, EnvChange::Set { name, value }) => {
                writeln!(script, "set \"{}={}\"", name, escape_for_cmd_set(value))
            }
            (ShellKind::Cmd, EnvChange::Unset { name }) => writeln!(script, "set \"{}=\"", name),
            (ShellKind::Powershell, EnvChange::Set { name, value }) => {
                writeln!(script, "$env:{} = '{}'", name, escape_for_powershell(value))
            }
            (ShellKind::Powershell, EnvChange::Unset { name }) => writeln!(
                script,
                "Remove-Item Env:{} -ErrorAction SilentlyContinue",
                name
            ),
        };
    }
    Ok(script)
}
