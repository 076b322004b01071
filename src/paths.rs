//! Where the binary keeps `mapforged.json` and its log files.
//!
//! Debug builds and `cargo run` use the working directory so a checkout is
//! self-contained. Installed builds use the user's platform directories.

use std::path::PathBuf;

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME};

fn use_working_dir() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

/// Directory holding the config file
pub fn config_dir() -> PathBuf {
    if use_working_dir() {
        return PathBuf::from(".");
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Directory for log files. Linux keeps them with other state, elsewhere
/// they go under local app data.
pub fn logs_dir() -> PathBuf {
    if use_working_dir() {
        return PathBuf::from("logs");
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Create the config directory so a first save can succeed
pub fn create_config_dir() -> std::io::Result<()> {
    std::fs::create_dir_all(config_dir())
}
