//! Configuration loading and root folder resolution
//!
//! Every CAMPUS service stores its database and media under one shared root
//! folder. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CAMPUS_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CAMPUS_ROOT_FOLDER";

/// Optional TOML config file contents (`~/.config/campus/config.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Shared root folder override
    pub root_folder: Option<String>,
    /// Payment provider key id (can also live in the settings table)
    pub payment_key_id: Option<String>,
    /// Payment provider secret
    pub payment_key_secret: Option<String>,
    /// Video service API key
    pub video_api_key: Option<String>,
    /// Video service signing secret
    pub video_api_secret: Option<String>,
}

/// Service entry from the `module_config` table
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub module_name: String,
    pub host: String,
    pub port: u16,
    pub enabled: bool,
}

/// Resolve the shared root folder.
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config) = load_toml_config() {
        if let Some(root_folder) = config.root_folder {
            return PathBuf::from(root_folder);
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Load the TOML config file if one exists for this platform
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Locate the configuration file for the platform
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/campus/config.toml first, then /etc/campus/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("campus").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/campus/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("campus").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("campus"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/campus"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("campus"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/campus"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("campus"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\campus"))
    } else {
        PathBuf::from("./campus_data")
    }
}

/// Helpers derived from a resolved root folder
#[derive(Debug, Clone)]
pub struct RootFolder {
    path: PathBuf,
}

impl RootFolder {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create the root folder and its media subfolder if missing
    pub fn ensure_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.path)?;
        std::fs::create_dir_all(self.media_dir())?;
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Path of the shared SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.path.join("campus.db")
    }

    /// Folder holding uploaded media (thumbnails, lecture video/audio, notes)
    pub fn media_dir(&self) -> PathBuf {
        self.path.join("media")
    }
}

/// Load a service's host/port from the database
#[cfg(feature = "sqlx")]
pub async fn load_module_config(
    db: &sqlx::SqlitePool,
    module_name: &str,
) -> Result<ModuleConfig> {
    let record = sqlx::query_as::<_, (String, String, i64, i64)>(
        "SELECT module_name, host, port, enabled FROM module_config WHERE module_name = ?",
    )
    .bind(module_name)
    .fetch_one(db)
    .await?;

    Ok(ModuleConfig {
        module_name: record.0,
        host: record.1,
        port: record.2 as u16,
        enabled: record.3 != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let resolved = resolve_root_folder(Some("/tmp/campus-test"));
        assert_eq!(resolved, PathBuf::from("/tmp/campus-test"));
    }

    #[test]
    fn default_is_non_empty() {
        // Whatever the platform, the fallback must produce a usable path.
        let folder = default_root_folder();
        assert!(!folder.as_os_str().is_empty());
    }

    #[test]
    fn root_folder_paths() {
        let root = RootFolder::new(PathBuf::from("/data/campus"));
        assert_eq!(root.database_path(), PathBuf::from("/data/campus/campus.db"));
        assert_eq!(root.media_dir(), PathBuf::from("/data/campus/media"));
    }
}
