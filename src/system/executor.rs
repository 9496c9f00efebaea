// src/system/executor.rs

use crate::constants::PYTHON_MODE;
use crate::models::{ExecutionResult, ModuleRequest, ModuleTool};
use std::collections::HashMap;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Module command '{program}' could not be executed: {source}")]
    CommandFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Spawns the module tool for one request and captures its output.
///
/// This is the seam between the executor and the operating system; tests swap in
/// an implementation that returns canned output. `env` is the complete child
/// environment, or `None` to inherit the current process environment.
pub trait ModuleRunner {
    fn run(
        &self,
        tool: &ModuleTool,
        request: &ModuleRequest,
        env: Option<&HashMap<String, String>>,
    ) -> Result<ExecutionResult, ExecutionError>;
}

impl<T: ModuleRunner + ?Sized> ModuleRunner for &T {
    fn run(
        &self,
        tool: &ModuleTool,
        request: &ModuleRequest,
        env: Option<&HashMap<String, String>>,
    ) -> Result<ExecutionResult, ExecutionError> {
        (**self).run(tool, request, env)
    }
}

/// Builds the full argv for a request: `python <action> <args...>`.
pub fn build_args(request: &ModuleRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(request.args.len() + 2);
    args.push(PYTHON_MODE.to_string());
    args.extend(request.to_argv());
    args
}

/// Runs the module tool as a real child process.
///
/// Blocks until the process exits and both output streams are drained. Stdin is
/// closed so a tool that unexpectedly prompts cannot hang the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ModuleRunner for ProcessRunner {
    fn run(
        &self,
        tool: &ModuleTool,
        request: &ModuleRequest,
        env: Option<&HashMap<String, String>>,
    ) -> Result<ExecutionResult, ExecutionError> {
        let args = build_args(request);
        log::debug!("Executing: {} {}", tool.program.display(), args.join(" "));

        let mut command = StdCommand::new(&tool.program);
        command.args(&args);
        if let Some(vars) = env {
            command.env_clear().envs(vars);
        }

        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ExecutionError::CommandFailed {
                program: tool.program.display().to_string(),
                source: e,
            })?;

        let exit_code = output.status.code();
        if exit_code.is_none() {
            log::warn!(
                "Module command '{}' terminated without an exit code.",
                tool.program.display()
            );
        }

        Ok(ExecutionResult {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_request_python_mode_and_keep_order() {
        let request = ModuleRequest::new("swap", ["sems-gcc/4.8.4", "sems-gcc/7.3.0"]);
        assert_eq!(
            build_args(&request),
            vec!["python", "swap", "sems-gcc/4.8.4", "sems-gcc/7.3.0"]
        );
    }

    #[test]
    fn spawn_failure_is_reported() {
        let tool = ModuleTool::new("/nonexistent/envmod-test/modulecmd");
        let err = ProcessRunner
            .run(&tool, &ModuleRequest::new("load", "x/1.0"), None)
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/envmod-test/modulecmd"));
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_stderr_and_exit_code() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("modulecmd");
        fs::write(
            &script,
            "#!/bin/sh\necho \"os.environ['ARGS'] = '$* $MODULEPATH'\"\necho 'ERROR: boom' >&2\nexit 3\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let env: HashMap<String, String> = [("MODULEPATH".to_string(), "/opt/mf".to_string())].into();
        let result = ProcessRunner
            .run(
                &ModuleTool::new(&script),
                &ModuleRequest::new("load", "gcc/7.3.0"),
                Some(&env),
            )
            .unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr_text(), "ERROR: boom\n");
        assert_eq!(
            String::from_utf8(result.stdout).unwrap(),
            "os.environ['ARGS'] = 'python load gcc/7.3.0 /opt/mf'\n"
        );
    }
}
