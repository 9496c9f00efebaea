//! # envmod
//!
//! Runs Environment Modules / LMOD commands (`module load gcc`, `module swap ...`)
//! from Rust and applies the resulting environment changes to the current process.
//!
//! ```no_run
//! let status = envmod::module("load", "sems-gcc/7.3.0")?;
//! if status != 0 {
//!     eprintln!("module load failed");
//! }
//! # Ok::<(), envmod::ModuleError>(())
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use crate::core::environment::{EnvironmentTarget, ProcessEnvironment};
pub use crate::core::module::{ModuleError, ModuleExecutor, module, module_argv};
pub use crate::models::{
    EnvChange, ExecutionResult, MlStatus, ModuleAction, ModuleArgs, ModuleFlavor, ModuleOutcome,
    ModuleRequest, ModuleStatus,
};
