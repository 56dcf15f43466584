// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera device discovery
//!
//! Cameras are ordered by their V4L2 index. The first capture device plays
//! the role of the back camera and the second one the front camera, which
//! matches phones exposing the rear sensor first.

use crate::app::CameraFacing;
use std::path::PathBuf;
use tracing::{debug, info};
use v4l::video::Capture;

/// A video capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// V4L2 node index (`/dev/video<index>`)
    pub index: usize,
    pub path: PathBuf,
    /// Card name reported by the driver
    pub name: String,
}

/// Enumerate V4L2 nodes that can actually capture frames
///
/// UVC cameras expose a second metadata node per sensor. Those report no
/// capture formats and are skipped.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_path_buf();
            let device = match v4l::Device::with_path(&path) {
                Ok(device) => device,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Cannot open video node");
                    return None;
                }
            };

            let has_formats = device
                .enum_formats()
                .map(|formats| !formats.is_empty())
                .unwrap_or(false);
            if !has_formats {
                debug!(path = %path.display(), "Skipping node without capture formats");
                return None;
            }

            let name = device
                .query_caps()
                .map(|caps| caps.card)
                .ok()
                .or_else(|| node.name())
                .unwrap_or_else(|| format!("Camera {}", node.index()));

            Some(CameraDevice {
                index: node.index(),
                path,
                name,
            })
        })
        .collect();

    cameras.sort_by_key(|camera| camera.index);
    info!(count = cameras.len(), "Enumerated capture devices");
    cameras
}

/// Position of the device serving `facing` in an enumerated list
pub fn slot_for(facing: CameraFacing) -> usize {
    match facing {
        CameraFacing::Back => 0,
        CameraFacing::Front => 1,
    }
}

/// Pick the device for `facing`
pub fn device_for(cameras: &[CameraDevice], facing: CameraFacing) -> Option<&CameraDevice> {
    cameras.get(slot_for(facing))
}
