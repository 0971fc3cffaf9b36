//! Location of the root configuration file

use std::path::PathBuf;

const APP_DIR: &str = "flux-zombies";

/// Directory holding `config.yaml`
///
/// `FLUX_ZOMBIES_CONFIG_DIR` wins when set. Otherwise the platform config
/// directory is used: `$XDG_CONFIG_HOME` or `~/.config` on Unix, the roaming
/// AppData folder on Windows.
pub fn config_dir() -> PathBuf {
    match std::env::var_os("FLUX_ZOMBIES_CONFIG_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => platform_config_home().join(APP_DIR),
    }
}

/// Root configuration file, merged under any `--config` file
pub fn root_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

#[cfg(not(windows))]
fn platform_config_home() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

#[cfg(windows)]
fn platform_config_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
