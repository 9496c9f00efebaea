//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use envmod::core::locator::Locator;
use envmod::system::executor::{ExecutionError, ModuleRunner};
use envmod::{ExecutionResult, ModuleRequest};
use envmod::models::ModuleTool;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One recorded invocation of a [`CannedRunner`].
#[derive(Debug, Clone)]
pub struct Call {
    pub program: PathBuf,
    pub argv: Vec<String>,
    pub env: Option<HashMap<String, String>>,
}

/// A `ModuleRunner` that never spawns anything and answers every request with the
/// same output.
#[derive(Debug)]
pub struct CannedRunner {
    result: ExecutionResult,
    calls: RefCell<Vec<Call>>,
}

impl CannedRunner {
    pub fn new(exit_code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        Self {
            result: ExecutionResult::new(exit_code, stdout, stderr),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_result(result: ExecutionResult) -> Self {
        Self {
            result,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl ModuleRunner for CannedRunner {
    fn run(
        &self,
        tool: &ModuleTool,
        request: &ModuleRequest,
        env: Option<&HashMap<String, String>>,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.calls.borrow_mut().push(Call {
            program: tool.program.clone(),
            argv: request.to_argv(),
            env: env.cloned(),
        });
        Ok(self.result.clone())
    }
}

/// An existing file standing in for `modulecmd`. Keep it alive for the test's duration.
pub fn fake_tool() -> NamedTempFile {
    NamedTempFile::with_prefix("modulecmd-").unwrap()
}

pub fn locator_for(tool: &Path) -> Locator {
    Locator::with_explicit(tool)
}

/// Writes an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
