// SPDX-License-Identifier: GPL-3.0-only

//! Camera preview abstraction
//!
//! ```text
//! ┌─────────────────────┐   calls    ┌──────────────────┐
//! │  AppModel (update)  │ ─────────▶ │  Preview trait   │
//! └─────────────────────┘            └────────┬─────────┘
//!            ▲                                │
//!            │ Message::Preview(PreviewEvent) ▼
//!            │                       ┌──────────────────┐
//!            └────────────────────── │ GStreamerPreview │
//!                                    └──────────────────┘
//! ```
//!
//! Calls are synchronous and cheap. Anything slow (encoding a still,
//! finalizing a recording) runs off the event loop and reports back with a
//! [`PreviewEvent`].

pub mod pipeline;

pub use pipeline::{GStreamerPreview, VideoSource};

use crate::app::{CameraFacing, Orientation};
use crate::errors::{CameraError, RecordingError};
use crate::storage::MediaUri;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Callbacks from the preview to the controller
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    /// Camera opened or lost
    CameraAvailable(bool),
    /// Whether the active camera has a controllable flash
    FlashAvailable(bool),
    /// A still was written to this path
    MediaSaved(PathBuf),
    /// A recording was finalized and registered in the media store
    VideoSaved(MediaUri),
    /// A still or recording could not be saved
    CaptureFailed(String),
    /// Draw the focus marker at these preview coordinates (0.0-1.0)
    FocusRect { x: f32, y: f32 },
}

/// Latest preview frame for display, `None` while the camera is closed
pub type FrameSlot = Arc<Mutex<Option<image::RgbaImage>>>;

pub type PreviewEventSender = tokio::sync::mpsc::UnboundedSender<PreviewEvent>;
pub type PreviewEventReceiver = tokio::sync::mpsc::UnboundedReceiver<PreviewEvent>;

/// Camera device access used by the controller
pub trait Preview: Send {
    /// Open the camera facing `facing`
    fn set_camera(&mut self, facing: CameraFacing) -> Result<(), CameraError>;

    /// Close the camera, stopping any recording
    fn release_camera(&mut self);

    /// Write the next still to this path instead of the photo directory
    fn set_target_path(&mut self, path: PathBuf);

    fn enable_flash(&mut self);

    fn disable_flash(&mut self);

    fn auto_flash(&mut self);

    /// Capture a still; completion is reported via `MediaSaved`/`CaptureFailed`
    fn take_picture(&mut self);

    /// Start or stop recording
    ///
    /// Returns `Ok(true)` when a recording started and `Ok(false)` when the
    /// running one was stopped. The finished file arrives as `VideoSaved`.
    fn toggle_recording(&mut self) -> Result<bool, RecordingError>;

    /// Prepare for video mode
    fn init_recorder(&mut self) -> Result<(), RecordingError>;

    /// Prepare for photo mode
    fn init_photo_mode(&mut self);

    /// Switch to video mode for a video capture request
    fn try_switch_to_video(&mut self);

    fn device_orientation_changed(&mut self, orientation: Orientation);

    /// Focus around a point of the preview (0.0-1.0 coordinates)
    fn focus_at(&mut self, x: f32, y: f32);

    /// Move to the next capture resolution, returning it
    fn cycle_resolution(&mut self) -> Option<(u32, u32)>;

    /// Number of cameras available to switch between
    fn camera_count(&self) -> usize;
}
