// SPDX-License-Identifier: GPL-3.0-only

//! Flash state and hardware flash LED control
//!
//! [`FlashState`] is the user-facing setting cycled by the flash button.
//! Which states are legal depends on the capture mode: auto flash only
//! makes sense for stills, so video mode cycles between off and on.
//!
//! The hardware side drives LEDs exposed at `/sys/class/leds/*:flash`
//! through the torch (brightness) interface.

use crate::app::CameraMode;
use serde::{Deserialize, Serialize};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Flash setting for the active camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashState {
    #[default]
    Off,
    On,
    Auto,
}

impl FlashState {
    /// Next state in the cycle for `mode`
    ///
    /// Photo: Off -> On -> Auto -> Off. Video: Off -> On -> Off.
    pub fn next(self, mode: CameraMode) -> Self {
        match (self, mode) {
            (FlashState::Off, _) => FlashState::On,
            (FlashState::On, CameraMode::Photo) => FlashState::Auto,
            (FlashState::On, CameraMode::Video) => FlashState::Off,
            (FlashState::Auto, _) => FlashState::Off,
        }
    }

    /// Clamp the state to what `mode` allows
    pub fn legal_for(self, mode: CameraMode) -> Self {
        match (self, mode) {
            (FlashState::Auto, CameraMode::Video) => FlashState::Off,
            (state, _) => state,
        }
    }

    pub fn is_legal_for(self, mode: CameraMode) -> bool {
        self.legal_for(mode) == self
    }
}

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl FlashDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Result of hardware flash detection.
///
/// Separates "hardware exists" from "we can control it" so the UI can show
/// a permission hint instead of silently hiding the flash button.
#[derive(Debug, Clone, Default)]
pub struct FlashHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<FlashDevice>,
    /// User-facing error if hardware was found but not writable
    pub permission_error: Option<String>,
}

impl FlashHardware {
    /// Scan `/sys/class/leds/` for `*:flash` entries.
    pub fn detect() -> FlashHardware {
        Self::detect_in(Path::new("/sys/class/leds"))
    }

    /// Scan a leds class directory (split out so it can point at a fixture)
    pub fn detect_in(leds_dir: &Path) -> FlashHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            warn!(path = %leds_dir.display(), "Cannot read leds directory, flash discovery skipped");
            return FlashHardware::default();
        };

        let mut devices = Vec::new();
        let mut permission_failures: Vec<(String, PathBuf)> = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            match std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered flash LED");
                    devices.push(FlashDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(_) => {
                    warn!(
                        path = %brightness_path.display(),
                        "Flash LED found but not writable"
                    );
                    permission_failures.push((name_str.to_string(), brightness_path));
                }
            }
        }

        // white before yellow
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if !permission_failures.is_empty() && devices.is_empty() {
            Some(Self::build_permission_error(&permission_failures))
        } else {
            None
        };

        FlashHardware {
            devices,
            permission_error,
        }
    }

    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Hint naming the group that owns the LED brightness file
    fn build_permission_error(failures: &[(String, PathBuf)]) -> String {
        let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());

        let group = failures
            .first()
            .and_then(|(_, path)| {
                let gid = std::fs::metadata(path).ok()?.gid();
                let group_contents = std::fs::read_to_string("/etc/group").ok()?;
                group_contents.lines().find_map(|line| {
                    let parts: Vec<&str> = line.split(':').collect();
                    (parts.len() >= 3 && parts[2].parse::<u32>().ok() == Some(gid))
                        .then(|| parts[0].to_string())
                })
            })
            .unwrap_or_else(|| "feedbackd".to_string());

        format!(
            "Flash LEDs detected but cannot be controlled. \
             Add {username} to the '{group}' group, then log out and back in."
        )
    }

    /// Turn on every controllable LED at full brightness
    pub fn all_on(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.torch(1.0) {
                warn!(device = %dev.name, error = %e, "Failed to turn on flash LED");
            }
        }
    }

    pub fn all_off(&self) {
        for dev in &self.devices {
            if let Err(e) = dev.off() {
                warn!(device = %dev.name, error = %e, "Failed to turn off flash LED");
            }
        }
    }
}
