// SPDX-License-Identifier: GPL-3.0-only

//! Accelerometer polling through the IIO sysfs interface
//!
//! Linux phones expose their accelerometer as
//! `/sys/bus/iio/devices/iio:deviceN/in_accel_x_raw` plus a scale. Only the
//! x axis is needed to tell portrait from landscape.

use crate::constants::timing::SENSOR_POLL_INTERVAL;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// An accelerometer x axis in m/s²
#[derive(Debug, Clone)]
pub struct Accelerometer {
    raw_path: PathBuf,
    scale: f32,
}

impl Accelerometer {
    pub fn detect() -> Option<Self> {
        Self::detect_in(Path::new("/sys/bus/iio/devices"))
    }

    pub fn detect_in(devices_dir: &Path) -> Option<Self> {
        let entries = std::fs::read_dir(devices_dir).ok()?;
        let mut candidates: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.join("in_accel_x_raw").is_file())
            .collect();
        candidates.sort();

        let device = candidates.into_iter().next()?;
        let scale = ["in_accel_x_scale", "in_accel_scale"]
            .iter()
            .find_map(|name| read_f32(&device.join(name)))
            .unwrap_or(1.0);

        info!(device = %device.display(), scale, "Found accelerometer");
        Some(Self {
            raw_path: device.join("in_accel_x_raw"),
            scale,
        })
    }

    /// Current x acceleration in m/s²
    pub fn read_x(&self) -> Option<f32> {
        read_f32(&self.raw_path).map(|raw| raw * self.scale)
    }

    /// Poll on a thread, sending samples until the handle is stopped or dropped
    pub fn spawn(self, samples: UnboundedSender<f32>) -> SensorHandle {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        std::thread::spawn(move || {
            debug!("Accelerometer polling started");
            while flag.load(Ordering::Relaxed) {
                if let Some(x) = self.read_x() {
                    if samples.send(x).is_err() {
                        break;
                    }
                }
                std::thread::sleep(SENSOR_POLL_INTERVAL);
            }
            debug!("Accelerometer polling stopped");
        });
        SensorHandle { running }
    }
}

/// Stops polling when dropped
#[derive(Debug)]
pub struct SensorHandle {
    running: Arc<AtomicBool>,
}

impl SensorHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for SensorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_f32(path: &Path) -> Option<f32> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().parse().ok(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot read sensor attribute");
            None
        }
    }
}
