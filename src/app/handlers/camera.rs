// SPDX-License-Identifier: GPL-3.0-only

//! Camera selection, availability, resolution and focus

use crate::app::state::{AppModel, CameraToggleIcon, Control, FocusMarker, Message, Notice};
use crate::app::task::Task;
use crate::constants::timing;
use tracing::{debug, info, warn};

impl AppModel {
    /// Notice task when the camera is not usable
    pub(crate) fn require_camera(&self) -> Option<Task> {
        if self.is_camera_available {
            None
        } else {
            debug!("Camera input while unavailable");
            Some(self.notice(Notice::CameraUnavailable))
        }
    }

    pub(crate) fn show_toggle_camera_if_needed(&mut self) {
        self.controls.camera_toggle_visible = self.preview.camera_count() > 1;
    }

    /// Switch between front and back camera
    ///
    /// When the other camera cannot be opened the previous one is restored,
    /// including the persisted choice.
    pub(crate) fn handle_toggle_camera(&mut self) -> Task {
        // Hidden while recording or with a single camera
        if !self.controls.is_clickable(Control::CameraToggle) {
            return Task::none();
        }
        if let Some(task) = self.require_camera() {
            return task;
        }

        let previous = self.facing;
        let next = previous.toggled();
        self.facing = next;
        self.config.last_used_camera = next;
        self.save_config();

        self.preview.release_camera();
        match self.preview.set_camera(next) {
            Ok(()) => {
                info!(facing = ?next, "Camera switched");
                self.is_camera_available = true;
                self.controls.camera_toggle_icon = CameraToggleIcon::for_facing(next);
                self.disable_flash();
                self.hide_timer();
                Task::none()
            }
            Err(e) => {
                warn!(facing = ?next, error = %e, "Camera switch failed, restoring previous camera");
                self.facing = previous;
                self.config.last_used_camera = previous;
                self.save_config();
                self.is_camera_available = match self.preview.set_camera(previous) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(facing = ?previous, error = %e, "Failed to reopen previous camera");
                        false
                    }
                };
                self.notice(Notice::CameraSwitchError)
            }
        }
    }

    pub(crate) fn handle_camera_available(&mut self, available: bool) -> Task {
        debug!(available, "Camera availability changed");
        self.is_camera_available = available;
        Task::none()
    }

    pub(crate) fn handle_change_resolution(&mut self) -> Task {
        if !self.controls.is_clickable(Control::ChangeResolution) {
            return Task::none();
        }
        if let Some(task) = self.require_camera() {
            return task;
        }

        match self.preview.cycle_resolution() {
            Some((width, height)) => {
                self.controls.resolution = Some((width, height));
                self.notice(Notice::ResolutionChanged(width, height))
            }
            None => Task::none(),
        }
    }

    pub(crate) fn handle_preview_tapped(&mut self, x: f32, y: f32) -> Task {
        if self.is_camera_available {
            self.preview.focus_at(x, y);
        }
        Task::none()
    }

    pub(crate) fn handle_focus_rect(&mut self, x: f32, y: f32) -> Task {
        self.controls.focus = Some(FocusMarker { x, y });
        self.timers.focus += 1;
        Task::delay(
            timing::FOCUS_RECT_DURATION,
            Message::ClearFocusRect(self.timers.focus),
        )
    }

    pub(crate) fn handle_clear_focus_rect(&mut self, generation: u64) -> Task {
        if generation == self.timers.focus {
            self.controls.focus = None;
        }
        Task::none()
    }
}
