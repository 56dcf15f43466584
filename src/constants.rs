// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Idle time before the secondary controls fade out
    pub const FADE_DELAY: Duration = Duration::from_millis(5000);

    /// How long the bottom controls stay hidden after a photo shutter press
    pub const PHOTO_PREVIEW_LENGTH: Duration = Duration::from_millis(500);

    /// Recording timer tick
    pub const RECORDING_TICK: Duration = Duration::from_secs(1);

    /// How long the focus marker stays on screen
    pub const FOCUS_RECT_DURATION: Duration = Duration::from_millis(1000);

    /// How long a notice stays visible in the terminal front end
    pub const NOTICE_DURATION: Duration = Duration::from_millis(2500);

    /// Accelerometer polling interval (roughly a game-rate sensor)
    pub const SENSOR_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Pipeline state change timeout when opening a camera
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Timeout waiting for EOS when finalizing a recording
    pub const STOP_TIMEOUT_SECS: u64 = 5;

    /// Timeout pulling a still frame from the preview sink
    pub const FRAME_PULL_TIMEOUT_MS: u64 = 1000;
}

/// Orientation sensor constants
pub mod orientation {
    /// Accelerometer x-axis magnitude (m/s²) at which the device counts as landscape
    pub const LANDSCAPE_THRESHOLD: f32 = 6.5;
}

/// Widget opacity values
pub mod ui {
    /// Fully visible control
    pub const OPAQUE: f32 = 1.0;

    /// Settings control after fading out (still clickable)
    pub const SETTINGS_FADED_ALPHA: f32 = 0.5;

    /// Other secondary controls after fading out
    pub const HIDDEN: f32 = 0.0;

    /// Thumbnail edge length in pixels
    pub const THUMBNAIL_SIZE: u32 = 96;
}

/// Flash constants
pub mod flash {
    /// Mean luminance (0.0-1.0) below which auto flash fires
    pub const AUTO_FLASH_LUMA_THRESHOLD: f32 = 0.25;

    /// Time the LED is lit before the still frame is grabbed
    pub const PRE_FLASH_MS: u64 = 300;
}

/// Capture resolutions offered by the change-resolution control
pub const RESOLUTION_PRESETS: &[(u32, u32)] = &[(1280, 720), (1920, 1080), (640, 480)];

/// Supported file formats in the media store
pub mod file_formats {
    /// Photo file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

    /// Video file extensions
    pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    /// Check if a file extension is a supported video format
    pub fn is_video_extension(ext: &str) -> bool {
        VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// A release with user-facing notes shown once after upgrading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub id: u32,
    pub notes: &'static str,
}

/// Release notes, oldest first
pub const RELEASES: &[Release] = &[
    Release {
        id: 33,
        notes: "Added a hardware camera key shutter and a capture timer",
    },
    Release {
        id: 35,
        notes: "Flash can now be set to auto in photo mode",
    },
];

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Newest release id known to this build
    pub fn latest_release() -> u32 {
        super::RELEASES.last().map(|r| r.id).unwrap_or(0)
    }
}

/// Format a duration in seconds as `MM:SS`, or `H:MM:SS` from one hour on
pub fn format_duration(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
