// src/models.rs

use std::fmt;
use std::path::PathBuf;

// --- REQUEST MODELS ---

/// A module sub-command such as `load` or `swap`.
///
/// Verbs the crate does not know are kept verbatim in `Other`; the module tool
/// is the one that decides whether they are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleAction {
    Use,
    Unuse,
    Load,
    Unload,
    Swap,
    Purge,
    List,
    Avail,
    Show,
    Other(String),
}

impl ModuleAction {
    /// The verb as passed on the module tool's command line.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Use => "use",
            Self::Unuse => "unuse",
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Swap => "swap",
            Self::Purge => "purge",
            Self::List => "list",
            Self::Avail => "avail",
            Self::Show => "show",
            Self::Other(verb) => verb,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl From<&str> for ModuleAction {
    fn from(verb: &str) -> Self {
        match verb {
            "use" => Self::Use,
            "unuse" => Self::Unuse,
            "load" | "add" => Self::Load,
            "unload" | "rm" => Self::Unload,
            "swap" | "switch" => Self::Swap,
            "purge" => Self::Purge,
            "list" => Self::List,
            "avail" => Self::Avail,
            "show" | "display" => Self::Show,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ModuleAction {
    fn from(verb: String) -> Self {
        Self::from(verb.as_str())
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a module action: either a single string or an ordered list.
///
/// Both forms normalize to the same argument vector; a single string is never split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleArgs {
    One(String),
    Many(Vec<String>),
}

impl ModuleArgs {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(arg) => vec![arg],
            Self::Many(args) => args,
        }
    }
}

impl From<&str> for ModuleArgs {
    fn from(arg: &str) -> Self {
        Self::One(arg.to_string())
    }
}

impl From<String> for ModuleArgs {
    fn from(arg: String) -> Self {
        Self::One(arg)
    }
}

impl From<Vec<String>> for ModuleArgs {
    fn from(args: Vec<String>) -> Self {
        Self::Many(args)
    }
}

impl From<Vec<&str>> for ModuleArgs {
    fn from(args: Vec<&str>) -> Self {
        Self::Many(args.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ModuleArgs {
    fn from(args: &[&str]) -> Self {
        Self::Many(args.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ModuleArgs {
    fn from(args: [&str; N]) -> Self {
        Self::Many(args.iter().map(|s| s.to_string()).collect())
    }
}

impl From<()> for ModuleArgs {
    fn from(_: ()) -> Self {
        Self::Many(Vec::new())
    }
}

/// A fully normalized module invocation: the action plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub action: ModuleAction,
    pub args: Vec<String>,
}

impl ModuleRequest {
    pub fn new(action: impl Into<ModuleAction>, args: impl Into<ModuleArgs>) -> Self {
        Self {
            action: action.into(),
            args: args.into().into_vec(),
        }
    }

    /// Builds a request from a flat argv whose first element is the action,
    /// e.g. `["unload", "sems-gcc/4.8.4"]`. Returns `None` for an empty argv.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let action: String = iter.next()?;
        Some(Self {
            action: ModuleAction::from(action),
            args: iter.collect(),
        })
    }

    /// Parses a shell-quoted command line such as `use "/opt/my modules"`.
    /// Returns `None` when the line cannot be tokenized or is empty.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let parts = shlex::split(line.trim())?;
        Self::from_argv(parts)
    }

    /// The action followed by its arguments, as passed to the module tool.
    pub fn to_argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.action.as_str().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for ModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv = self.to_argv();
        match shlex::try_join(argv.iter().map(String::as_str)) {
            Ok(joined) => f.write_str(&joined),
            Err(_) => f.write_str(&argv.join(" ")),
        }
    }
}

// --- TOOL MODELS ---

/// Which module system a located executable belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFlavor {
    /// Environment Modules (`modulecmd`, `modulecmd.tcl`).
    EnvironmentModules,
    /// LMOD (`lmod`).
    Lmod,
}

impl ModuleFlavor {
    /// Guesses the flavor from the executable's file name.
    pub fn from_program(program: &std::path::Path) -> Self {
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.starts_with("lmod") {
            Self::Lmod
        } else {
            Self::EnvironmentModules
        }
    }
}

impl fmt::Display for ModuleFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvironmentModules => f.write_str("Environment Modules"),
            Self::Lmod => f.write_str("LMOD"),
        }
    }
}

/// A located module-command executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTool {
    pub program: PathBuf,
    pub flavor: ModuleFlavor,
}

impl ModuleTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let flavor = ModuleFlavor::from_program(&program);
        Self { program, flavor }
    }
}

/// Raw output of one module tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// `None` when the process produced no exit status (e.g. killed by a signal).
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecutionResult {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

// --- RESULT MODELS ---

/// The `_mlstatus` signal reported by some module tool builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MlStatus {
    True,
    False,
    #[default]
    Absent,
}

impl MlStatus {
    pub fn is_present(self) -> bool {
        self != Self::Absent
    }
}

impl From<bool> for MlStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Classified result of a module operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    Success,
    /// Carries a non-zero status code.
    Failure(i32),
}

impl ModuleStatus {
    /// `0` for success, the non-zero failure code otherwise.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// An environment mutation that was applied to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvChange {
    Set { name: String, value: String },
    Unset { name: String },
}

impl EnvChange {
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. } | Self::Unset { name } => name,
        }
    }
}

/// Everything a module operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome {
    pub status: ModuleStatus,
    /// Mutations in the order they were applied.
    pub changes: Vec<EnvChange>,
    /// Tool stderr, decoded lossily.
    pub stderr: String,
    pub ml_status: MlStatus,
    pub flavor: ModuleFlavor,
}

impl ModuleOutcome {
    /// The integer status returned by [`crate::module`].
    pub fn code(&self) -> i32 {
        self.status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_string_and_list_normalize_identically() {
        let a = ModuleRequest::new("unload", "sems-gcc/4.8.4");
        let b = ModuleRequest::from_argv(["unload", "sems-gcc/4.8.4"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_argv(), vec!["unload", "sems-gcc/4.8.4"]);
    }

    #[test]
    fn single_argument_is_not_split() {
        let request = ModuleRequest::new("use", "/opt/my modules");
        assert_eq!(request.args, vec!["/opt/my modules"]);
    }

    #[test]
    fn swap_keeps_argument_order() {
        let request = ModuleRequest::new("swap", ["sems-gcc/4.8.4", "sems-gcc/7.3.0"]);
        assert_eq!(request.action, ModuleAction::Swap);
        assert_eq!(request.args, vec!["sems-gcc/4.8.4", "sems-gcc/7.3.0"]);
    }

    #[test]
    fn command_line_honours_quotes() {
        let request = ModuleRequest::from_command_line("use \"/opt/my modules\"").unwrap();
        assert_eq!(request.action, ModuleAction::Use);
        assert_eq!(request.args, vec!["/opt/my modules"]);
        assert!(ModuleRequest::from_command_line("   ").is_none());
        assert!(ModuleRequest::from_command_line("load \"unterminated").is_none());
    }

    #[test]
    fn unknown_verbs_are_kept() {
        let action = ModuleAction::from("spider");
        assert_eq!(action, ModuleAction::Other("spider".into()));
        assert_eq!(action.to_string(), "spider");
        assert!(ModuleAction::from("").is_empty());
    }

    #[test]
    fn flavor_follows_program_name() {
        assert_eq!(ModuleTool::new("/usr/share/lmod/lmod/libexec/lmod").flavor, ModuleFlavor::Lmod);
        assert_eq!(
            ModuleTool::new("/usr/share/Modules/libexec/modulecmd.tcl").flavor,
            ModuleFlavor::EnvironmentModules
        );
    }

    #[test]
    fn display_round_trips_through_command_line() {
        let request = ModuleRequest::new("use", "/opt/my modules");
        let parsed = ModuleRequest::from_command_line(&request.to_string()).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn ml_status_presence() {
        assert!(MlStatus::from(false).is_present());
        assert!(MlStatus::True.is_present());
        assert!(!MlStatus::default().is_present());
    }
}
