//! Application constants
//!
//! Centralized location for file names and configuration defaults.

/// Directory under the home directory holding show configs
pub const CONFIG_DIR_NAME: &str = ".muse";

/// Show config looked up when no path is given
pub const DEFAULT_SHOW_FILE: &str = "show.yaml";

/// Log file written by the binary
pub const LOG_FILE: &str = "muse-state.log";

/// Application name
pub const APP_NAME: &str = "MUSE state";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
