// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! Shutter dispatch, the recording timer and completion of saved media.

use crate::app::state::{AppModel, CameraMode, CaptureResult, Message, Notice, ShutterIcon};
use crate::app::task::Task;
use crate::constants::{self, timing, ui};
use crate::storage::MediaUri;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

impl AppModel {
    pub(crate) fn handle_shutter_pressed(&mut self) -> Task {
        if let Some(task) = self.require_camera() {
            return task;
        }
        self.handle_shutter()
    }

    fn handle_shutter(&mut self) -> Task {
        match self.mode {
            CameraMode::Photo => {
                self.toggle_bottom_buttons(true);
                self.preview.take_picture();
                self.timers.bottom += 1;
                Task::delay(
                    timing::PHOTO_PREVIEW_LENGTH,
                    Message::RestoreBottomControls(self.timers.bottom),
                )
            }
            CameraMode::Video => match self.preview.toggle_recording() {
                Ok(true) => {
                    info!("Recording started");
                    self.controls.shutter_icon = ShutterIcon::VideoStop;
                    self.controls.camera_toggle_visible = false;
                    self.show_timer()
                }
                Ok(false) => {
                    info!(seconds = self.recording_secs, "Recording stopped");
                    self.recording_stopped();
                    Task::none()
                }
                Err(e) => {
                    error!(error = %e, "Recording toggle failed");
                    self.recording_stopped();
                    self.notice(Notice::CaptureFailed(e.to_string()))
                }
            },
        }
    }

    fn recording_stopped(&mut self) {
        self.controls.shutter_icon = ShutterIcon::VideoRec;
        self.show_toggle_camera_if_needed();
        self.hide_timer();
    }

    fn toggle_bottom_buttons(&mut self, hide: bool) {
        self.controls.bottom_alpha = if hide { ui::HIDDEN } else { ui::OPAQUE };
    }

    pub(crate) fn handle_restore_bottom_controls(&mut self, generation: u64) -> Task {
        if generation == self.timers.bottom {
            self.toggle_bottom_buttons(false);
        }
        Task::none()
    }

    /// Start counting recorded seconds from zero
    fn show_timer(&mut self) -> Task {
        self.is_recording = true;
        self.recording_secs = 0;
        self.controls.timer_text = constants::format_duration(0);
        self.controls.timer_visible = true;
        self.timers.recording += 1;
        Task::delay(
            timing::RECORDING_TICK,
            Message::RecordingTick(self.timers.recording),
        )
    }

    /// Stop counting and reset the timer to zero
    pub(crate) fn hide_timer(&mut self) {
        self.is_recording = false;
        self.recording_secs = 0;
        self.controls.timer_text = constants::format_duration(0);
        self.controls.timer_visible = false;
        self.timers.recording += 1;
    }

    pub(crate) fn handle_recording_tick(&mut self, generation: u64) -> Task {
        if generation != self.timers.recording || !self.is_recording {
            return Task::none();
        }
        self.recording_secs += 1;
        self.controls.timer_text = constants::format_duration(self.recording_secs);
        Task::delay(timing::RECORDING_TICK, Message::RecordingTick(generation))
    }

    /// A still was written; register it and refresh the thumbnail
    pub(crate) fn handle_media_saved(&mut self, path: PathBuf) -> Task {
        info!(path = %path.display(), "Media saved");
        let store = Arc::clone(&self.media_store);
        let scan = Task::perform(
            async move {
                tokio::task::spawn_blocking(move || store.scan_file(&path))
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|result| result.map_err(|e| e.to_string()))
            },
            Message::MediaScanned,
        );

        if self.intent.is_image() {
            return Task::batch([scan, self.finish(CaptureResult::Ok { uri: None })]);
        }
        scan
    }

    pub(crate) fn handle_media_scanned(&mut self, result: Result<MediaUri, String>) -> Task {
        if let Err(e) = &result {
            warn!(error = %e, "Saved media could not be scanned");
        }
        self.setup_preview_image(self.mode)
    }

    /// A recording was finalized and registered
    pub(crate) fn handle_video_saved(&mut self, uri: MediaUri) -> Task {
        info!(uri = %uri, "Video saved");
        let refresh = self.setup_preview_image(self.mode);
        if self.intent.is_video() {
            return Task::batch([refresh, self.finish(CaptureResult::Ok { uri: Some(uri) })]);
        }
        refresh
    }

    pub(crate) fn handle_capture_failed(&mut self, reason: String) -> Task {
        error!(reason = %reason, "Capture failed");
        self.toggle_bottom_buttons(false);
        self.notice(Notice::CaptureFailed(reason))
    }
}
