//! # System Interaction Layer
//!
//! Boundary between module-command logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns the module command and captures stdout, stderr and exit
//!   code behind the `ModuleRunner` trait, so the rest of the crate can be driven
//!   with canned output.
//! - **`shell`**: renders applied environment changes as statements for POSIX shells,
//!   `cmd.exe` or PowerShell, for callers that cannot share our process environment.

pub mod executor;
pub mod shell;
