//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps the
//!   config and settings files in that directory.
//! - **Installed mode** (default): files live in the platform data directory
//!   under `MCU Bridge`.
//!
//! Debug builds prefer the working directory when it holds a `config.yaml`.

use std::path::{Path, PathBuf};

/// Application name used for directories in installed mode
const APP_NAME: &str = "MCU Bridge";

const CONFIG_FILE: &str = "config.yaml";
const SETTINGS_FILE: &str = "param-settings.yaml";

/// Where the bridge keeps its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Default configuration file
    pub config: PathBuf,
    /// Default user parameter settings file
    pub settings: PathBuf,
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(CONFIG_FILE).exists() {
                eprintln!("[paths] Running in DEV mode ({})", cwd.display());
                return Self::in_dir(&cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            return Self::in_dir(&exe_dir, true);
        }

        let base = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no data directory, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);
        Self::in_dir(&base, false)
    }

    /// All files under one directory
    pub fn in_dir(dir: &Path, is_portable: bool) -> Self {
        Self {
            config: dir.join(CONFIG_FILE),
            settings: dir.join(SETTINGS_FILE),
            is_portable,
        }
    }

    /// Get the base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_in_dir() {
        let paths = AppPaths::in_dir(Path::new("data"), false);
        assert_eq!(paths.config, PathBuf::from("data/config.yaml"));
        assert_eq!(paths.settings, PathBuf::from("data/param-settings.yaml"));
        assert_eq!(paths.base_dir(), PathBuf::from("data"));
        assert!(!paths.is_portable);
    }
}
