// SPDX-License-Identifier: GPL-3.0-only

//! Persistent user configuration
//!
//! Stored as JSON under `$XDG_CONFIG_HOME/<app id>/v<VERSION>/config.json`,
//! so a breaking layout change just bumps [`Config::VERSION`].

use crate::app::CameraFacing;
use crate::errors::AppResult;
use crate::flash::FlashState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera used last, restored on start
    pub last_used_camera: CameraFacing,
    /// Flash setting, restored on start
    pub flashlight_state: FlashState,
    /// Cleared once the camera screen has been closed for the first time
    pub is_first_run: bool,
    /// Accent colour for the focus marker, as `#rrggbb`
    pub primary_color: String,
    /// Newest release whose notes were shown
    pub last_seen_release: u32,
    /// Folder name under Pictures/Videos where media is saved
    pub save_folder_name: String,
    /// Application used to review the last photo/video before the default handler
    pub review_app: Option<String>,
}

impl Config {
    pub const VERSION: u64 = 1;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_used_camera: CameraFacing::Back,
            flashlight_state: FlashState::Off,
            is_first_run: true,
            primary_color: "#f57c00".to_string(),
            last_seen_release: 0,
            save_folder_name: "Camera".to_string(),
            review_app: None,
        }
    }
}

/// Reads and writes a [`Config`] at a fixed path
#[derive(Debug, Clone)]
pub struct ConfigHandler {
    path: PathBuf,
}

impl ConfigHandler {
    /// Handler for the per-user config of `app_id`
    pub fn new(app_id: &str, version: u64) -> AppResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| crate::errors::AppError::Config("no config directory".to_string()))?;
        Ok(Self::at(
            base.join(app_id)
                .join(format!("v{}", version))
                .join("config.json"),
        ))
    }

    /// Handler for an explicit file path
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config
    ///
    /// A missing file yields the defaults. A malformed file yields the
    /// defaults plus the parse error so the caller can log it.
    pub fn get_entry(&self) -> Result<Config, (String, Config)> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No config file yet, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err((e.to_string(), Config::default())),
        };
        serde_json::from_str(&contents).map_err(|e| (e.to_string(), Config::default()))
    }

    /// Persist the whole config
    pub fn write_entry(&self, config: &Config) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

/// Load config for `app_id`, falling back to defaults on any error
pub fn load(app_id: &str) -> (Option<ConfigHandler>, Config) {
    match ConfigHandler::new(app_id, Config::VERSION) {
        Ok(handler) => {
            let config = match handler.get_entry() {
                Ok(config) => config,
                Err((err, config)) => {
                    error!(error = %err, "Errors loading config");
                    config
                }
            };
            (Some(handler), config)
        }
        Err(err) => {
            error!(%err, "Failed to create config handler");
            (None, Config::default())
        }
    }
}
