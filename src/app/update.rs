// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` only routes messages to the handler methods in the
//! `handlers` submodules:
//!
//! - `handlers::lifecycle`: create/resume/pause/destroy, hardware key
//! - `handlers::permissions`: permission gate and request results
//! - `handlers::camera`: camera toggle, availability, resolution, focus
//! - `handlers::flash`: flash cycle and availability
//! - `handlers::capture`: shutter, recording timer, saved media
//! - `handlers::mode`: photo/video switching
//! - `handlers::sensor`: orientation reactor
//! - `handlers::gallery`: last media thumbnail and viewer
//! - `handlers::ui`: fading, settings, notices

use crate::app::state::{AppModel, Message};
use crate::app::task::Task;
use crate::backends::preview::PreviewEvent;
use tracing::debug;

impl AppModel {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task {
        // Teardown still has to release the camera
        if self.finished.is_some() && !matches!(message, Message::Pause | Message::Destroy) {
            debug!(?message, "Ignoring message after finish");
            return Task::none();
        }

        match message {
            // ===== Lifecycle =====
            Message::Create => self.handle_create(),
            Message::Resume => self.handle_resume(),
            Message::Pause => self.handle_pause(),
            Message::Destroy => self.handle_destroy(),
            Message::KeyDown(key) => self.handle_key_down(key),
            Message::KeyUp(key) => self.handle_key_up(key),
            Message::PermissionsResult { request, grants } => {
                self.handle_permissions_result(request, grants)
            }

            // ===== Input =====
            Message::ToggleCamera => self.handle_toggle_camera(),
            Message::ToggleFlash => self.handle_toggle_flash(),
            Message::Shutter => self.handle_shutter_pressed(),
            Message::TogglePhotoVideo => self.handle_toggle_photo_video(),
            Message::ShowLastMedia => self.handle_show_last_media(),
            Message::OpenSettings => self.handle_open_settings(),
            Message::ChangeResolution => self.handle_change_resolution(),
            Message::PreviewTapped { x, y } => self.handle_preview_tapped(x, y),

            // ===== Sensors and callbacks =====
            Message::AccelerometerSample(x) => self.handle_accelerometer_sample(x),
            Message::Preview(event) => match event {
                PreviewEvent::CameraAvailable(available) => {
                    self.handle_camera_available(available)
                }
                PreviewEvent::FlashAvailable(available) => self.handle_flash_available(available),
                PreviewEvent::MediaSaved(path) => self.handle_media_saved(path),
                PreviewEvent::VideoSaved(uri) => self.handle_video_saved(uri),
                PreviewEvent::CaptureFailed(reason) => self.handle_capture_failed(reason),
                PreviewEvent::FocusRect { x, y } => self.handle_focus_rect(x, y),
            },

            // ===== Timers and background work =====
            Message::RecordingTick(generation) => self.handle_recording_tick(generation),
            Message::RestoreBottomControls(generation) => {
                self.handle_restore_bottom_controls(generation)
            }
            Message::FadeOutControls(generation) => self.handle_fade_out_controls(generation),
            Message::ClearFocusRect(generation) => self.handle_clear_focus_rect(generation),
            Message::LastMediaLoaded(kind, uri) => self.handle_last_media_loaded(kind, uri),
            Message::ThumbnailLoaded(thumbnail) => self.handle_thumbnail_loaded(thumbnail),
            Message::MediaScanned(result) => self.handle_media_scanned(result),
        }
    }
}
