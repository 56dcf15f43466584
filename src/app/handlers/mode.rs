// SPDX-License-Identifier: GPL-3.0-only

//! Photo/video switching

use crate::app::state::{
    AppModel, CameraMode, Control, ModeToggleIcon, Notice, PermissionRequest, ShutterIcon,
};
use crate::app::task::Task;
use crate::backends::permissions::Permission;
use tracing::{info, warn};

impl AppModel {
    pub(crate) fn handle_toggle_photo_video(&mut self) -> Task {
        if !self.controls.is_clickable(Control::ModeToggle) {
            return Task::none();
        }
        let (task, toggled) = self.toggle_photo_video();
        if toggled {
            return Task::batch([task, self.check_buttons()]);
        }
        task
    }

    /// Flip the mode, returning whether it actually flipped
    ///
    /// Without audio permission this asks for it instead and the flip
    /// happens once the grant arrives.
    pub(crate) fn toggle_photo_video(&mut self) -> (Task, bool) {
        if let Some(task) = self.require_camera() {
            return (task, false);
        }

        if !self.permissions.has(Permission::RecordAudio) {
            self.is_asking_permissions = true;
            let request =
                self.request_permissions(PermissionRequest::RecordAudio, vec![Permission::RecordAudio]);
            return (request, false);
        }

        if self.is_recording {
            match self.preview.toggle_recording() {
                Ok(_) => info!(seconds = self.recording_secs, "Recording stopped by mode switch"),
                Err(e) => warn!(error = %e, "Failed to stop recording on mode switch"),
            }
        }

        if self.intent.is_video() {
            self.preview.try_switch_to_video();
        }

        self.disable_flash();
        self.hide_timer();
        self.mode = match self.mode {
            CameraMode::Photo => CameraMode::Video,
            CameraMode::Video => CameraMode::Photo,
        };
        self.show_toggle_camera_if_needed();
        info!(mode = ?self.mode, "Mode switched");
        (Task::none(), true)
    }

    /// Bring controls and preview in line with the current mode
    pub(crate) fn check_buttons(&mut self) -> Task {
        match self.mode {
            CameraMode::Photo => self.init_photo_mode(),
            CameraMode::Video => self.try_init_video_mode(),
        }
    }

    fn init_photo_mode(&mut self) -> Task {
        self.controls.mode_toggle_icon = ModeToggleIcon::Video;
        self.controls.shutter_icon = ShutterIcon::Shutter;
        self.preview.init_photo_mode();
        self.setup_preview_image(CameraMode::Photo)
    }

    fn try_init_video_mode(&mut self) -> Task {
        match self.preview.init_recorder() {
            Ok(()) => self.init_video_buttons(),
            Err(e) => {
                warn!(error = %e, "Recorder could not be initialized");
                if self.intent.is_video() {
                    Task::none()
                } else {
                    self.notice(Notice::VideoModeError)
                }
            }
        }
    }

    pub(crate) fn init_video_buttons(&mut self) -> Task {
        self.controls.mode_toggle_icon = ModeToggleIcon::Camera;
        self.show_toggle_camera_if_needed();
        self.controls.shutter_icon = ShutterIcon::VideoRec;
        self.check_flash();
        self.setup_preview_image(CameraMode::Video)
    }
}
