// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that do not open the camera screen

use simple_camera::backends::audio::enumerate_audio_sources;
use simple_camera::app::CameraFacing;
use simple_camera::backends::camera::{enumerate_cameras, slot_for};
use simple_camera::constants::file_formats;
use simple_camera::flash::FlashHardware;
use std::path::Path;

/// Reject `--output` paths the encoder has no format for
pub fn check_image_output(path: &Path) -> Result<(), String> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(file_formats::is_image_extension);
    if supported {
        Ok(())
    } else {
        Err(format!(
            "Output {} must end in .{}",
            path.display(),
            file_formats::IMAGE_EXTENSIONS.join(", .")
        ))
    }
}

/// List cameras, flash LEDs and audio sources
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
    } else {
        println!("Available cameras:");
        println!();
        for (slot, camera) in cameras.iter().enumerate() {
            let role = [CameraFacing::Back, CameraFacing::Front]
                .into_iter()
                .find(|facing| slot_for(*facing) == slot)
                .map(|facing| format!(" ({:?})", facing).to_lowercase())
                .unwrap_or_default();
            println!("  [{}] {}{}", slot, camera.name, role);
            println!("      Device: {}", camera.path.display());
        }
    }
    println!();

    let flash = FlashHardware::detect();
    if flash.devices.is_empty() {
        println!("No flash LEDs found.");
    } else {
        println!("Flash LEDs:");
        for device in &flash.devices {
            println!("  {}", device.name());
        }
    }
    if let Some(hint) = &flash.permission_error {
        println!("  Note: {}", hint);
    }
    println!();

    let sources = enumerate_audio_sources();
    if sources.is_empty() {
        println!("No audio sources found.");
    } else {
        println!("Audio sources:");
        for source in &sources {
            let default = if source.is_default { " [default]" } else { "" };
            println!("  {}{}", source.name, default);
        }
    }

    Ok(())
}
