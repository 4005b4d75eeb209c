//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`COHORT_ROOT_FOLDER`, then `COHORT_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed TOML file never stops a service from starting:
//! a warning is logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "cohort.db";

/// Logging section of a module TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Optional log file path
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Contents of `~/.config/cohort/<module>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the shared database
    pub root_folder: Option<PathBuf>,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP port override
    pub port: Option<u16>,
    /// Minimum cumulative minutes for a participant to count as present
    pub min_duration_minutes: Option<f64>,
}

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/cohort (or /var/lib/cohort for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("cohort"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/cohort"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("cohort"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cohort"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("cohort"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cohort"))
    } else {
        PathBuf::from("./cohort_data")
    }
}

/// Locate the TOML file for a module, if one exists
///
/// Linux checks `~/.config/cohort/<module>.toml` then `/etc/cohort/<module>.toml`;
/// other platforms only check the per-user config directory.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let user_config = dirs::config_dir().map(|d| d.join("cohort").join(&file_name));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cohort").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the module TOML config, falling back to defaults on any problem
pub fn load_module_config(module_name: &str) -> TomlConfig {
    let Some(path) = config_file_path(module_name) else {
        debug!(module = module_name, "No TOML config file found, using defaults");
        return TomlConfig::default();
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded TOML config");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable TOML config");
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Command-line value, if one was given
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Resolve the root folder. Never fails; the compiled default is the floor.
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in ["COHORT_ROOT_FOLDER", "COHORT_ROOT"] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = load_module_config(&self.module_name).root_folder {
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if it is missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            tracing::info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Path of the shared SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_defaults_when_sections_missing() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_config_parses_all_fields() {
        let config: TomlConfig = toml::from_str(
            r#"
            root_folder = "/srv/cohort"
            port = 6000
            min_duration_minutes = 12.5

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/cohort")));
        assert_eq!(config.port, Some(6000));
        assert_eq!(config.min_duration_minutes, Some(12.5));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_database_path_is_inside_root() {
        let initializer = RootFolderInitializer::new(PathBuf::from("/tmp/cohort-root"));
        assert_eq!(
            initializer.database_path(),
            PathBuf::from("/tmp/cohort-root").join(DATABASE_FILE_NAME)
        );
    }
}
