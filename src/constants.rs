// src/constants.rs

/// Sub-command asking the module tool for python statements.
pub const PYTHON_MODE: &str = "python";

/// Set by Environment Modules 4+ to the path of `modulecmd.tcl`.
pub const MODULES_CMD_VAR: &str = "MODULES_CMD";

/// Set by LMOD to the path of its `lmod` executable.
pub const LMOD_CMD_VAR: &str = "LMOD_CMD";

/// Install prefix exported by both Environment Modules and LMOD init scripts.
pub const MODULESHOME_VAR: &str = "MODULESHOME";

/// Overrides the location of the configuration file.
pub const CONFIG_PATH_VAR: &str = "ENVMOD_CONFIG";

/// Name of the directory under the system config dir (`~/.config/envmod`).
pub const CONFIG_DIR_NAME: &str = "envmod";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Search path for the last discovery step.
pub const PATH_VAR: &str = "PATH";

/// Executables tried on `PATH`, in order.
pub const PATH_CANDIDATES: &[&str] = &["modulecmd", "modulecmd.tcl", "lmod"];

/// Marker some module tools print to stderr while still exiting with 0.
pub const STDERR_ERROR_MARKER: &str = "ERROR:";

/// Name of the python variable carrying the module tool's own status.
pub const MLSTATUS_VAR: &str = "_mlstatus";
