// src/core/status.rs

//! # Result Classification
//!
//! Module tools do not agree on how to report failure. Some exit non-zero, some exit
//! 0 and print `ERROR:` to stderr, and some builds print `_mlstatus = True|False`
//! independently of their exit code. [`classify`] is the only place where these
//! signals are combined:
//!
//! 1. `_mlstatus = False` on stderr: failure, whatever the exit code.
//! 2. `_mlstatus = True` on stderr: success, whatever the exit code.
//! 3. `_mlstatus` assigned by the mutation script itself: failure or success.
//! 4. No exit status at all: [`MissingStatus`] error.
//! 5. Non-zero exit code: failure.
//! 6. `ERROR:` on stderr: failure, despite the zero exit code.
//! 7. Otherwise success.

use crate::constants::STDERR_ERROR_MARKER;
use crate::models::{MlStatus, ModuleStatus};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref MLSTATUS_RE: Regex = Regex::new(r"\b_mlstatus\s*=\s*(True|False)\b").expect("valid regex");
}

/// Status code reported for failures detected from markers while the tool exited with 0.
pub const MARKER_FAILURE_CODE: i32 = 1;

/// The tool finished without any exit status and without an `_mlstatus` verdict.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("TypeError: the module tool returned no status code (expected an integer, got None)")]
pub struct MissingStatus;

/// Scans `text` for `_mlstatus = True|False`. A `False` marker anywhere wins over `True`.
pub fn scan_ml_status(text: &str) -> MlStatus {
    let mut status = MlStatus::Absent;
    for caps in MLSTATUS_RE.captures_iter(text) {
        match caps.get(1).map(|m| m.as_str()) {
            Some("False") => return MlStatus::False,
            Some("True") => status = MlStatus::True,
            _ => {}
        }
    }
    status
}

/// Combines exit code, stderr text and the script's own `_mlstatus` into a verdict.
pub fn classify(
    exit_code: Option<i32>,
    stderr: &str,
    script_status: MlStatus,
) -> Result<ModuleStatus, MissingStatus> {
    let failure_code = exit_code.filter(|code| *code != 0).unwrap_or(MARKER_FAILURE_CODE);

    match scan_ml_status(stderr) {
        MlStatus::False => return Ok(ModuleStatus::Failure(failure_code)),
        MlStatus::True => return Ok(ModuleStatus::Success),
        MlStatus::Absent => {}
    }

    match script_status {
        MlStatus::False => return Ok(ModuleStatus::Failure(failure_code)),
        MlStatus::True => return Ok(ModuleStatus::Success),
        MlStatus::Absent => {}
    }

    match exit_code {
        None => Err(MissingStatus),
        Some(code) if code != 0 => Ok(ModuleStatus::Failure(code)),
        Some(_) if stderr.contains(STDERR_ERROR_MARKER) => Ok(ModuleStatus::Failure(MARKER_FAILURE_CODE)),
        Some(_) => Ok(ModuleStatus::Success),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::clean_success(Some(0), "", MlStatus::Absent, 0)]
    #[case::nonzero_exit(Some(1), "", MlStatus::Absent, 1)]
    #[case::nonzero_exit_keeps_code(Some(3), "ERROR: Something wrong happened.", MlStatus::Absent, 3)]
    #[case::error_marker_with_zero_exit(Some(0), "ERROR: Something wrong happened.", MlStatus::Absent, 1)]
    #[case::stderr_mlstatus_false(Some(0), "_mlstatus = False", MlStatus::Absent, 1)]
    #[case::stderr_mlstatus_true_overrides_exit(Some(1), "_mlstatus = True", MlStatus::Absent, 0)]
    #[case::script_mlstatus_true(Some(0), "", MlStatus::True, 0)]
    #[case::script_mlstatus_false(Some(0), "", MlStatus::False, 1)]
    #[case::script_mlstatus_true_overrides_exit(Some(2), "", MlStatus::True, 0)]
    #[case::stderr_beats_script(Some(0), "_mlstatus = False", MlStatus::True, 1)]
    #[case::mlstatus_beats_error_marker(Some(0), "ERROR: noise\n_mlstatus = True", MlStatus::Absent, 0)]
    #[case::mlstatus_recovers_missing_exit(None, "_mlstatus = True", MlStatus::Absent, 0)]
    #[case::lowercase_error_is_not_a_marker(Some(0), "error: lowercase", MlStatus::Absent, 0)]
    fn classification(
        #[case] exit_code: Option<i32>,
        #[case] stderr: &str,
        #[case] script_status: MlStatus,
        #[case] expected: i32,
    ) {
        let status = classify(exit_code, stderr, script_status).unwrap();
        assert_eq!(status.code(), expected);
    }

    #[test]
    fn missing_exit_code_without_verdict_is_an_error() {
        assert_eq!(classify(None, "", MlStatus::Absent), Err(MissingStatus));
        assert!(MissingStatus.to_string().starts_with("TypeError"));
    }

    #[test]
    fn scan_prefers_false() {
        assert_eq!(scan_ml_status("_mlstatus = True\n_mlstatus = False"), MlStatus::False);
        assert_eq!(scan_ml_status("x\n_mlstatus=True\n"), MlStatus::True);
        assert_eq!(scan_ml_status("_mlstatus = maybe"), MlStatus::Absent);
    }

    #[rstest]
    #[case::prefixed_name("x_mlstatus = False")]
    #[case::longer_value("_mlstatus = Falsey")]
    #[case::longer_true("_mlstatus = Truer")]
    fn scan_ignores_partial_matches(#[case] text: &str) {
        assert_eq!(scan_ml_status(text), MlStatus::Absent);
    }
}
