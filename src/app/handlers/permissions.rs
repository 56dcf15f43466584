// SPDX-License-Identifier: GPL-3.0-only

//! Permission gate
//!
//! The camera is only set up with camera and storage access. Video mode
//! additionally needs audio recording.

use crate::app::state::{
    AppModel, CameraMode, CameraToggleIcon, CaptureIntent, CaptureResult, Message, Notice,
    PermissionRequest, ShutterIcon,
};
use crate::app::task::Task;
use crate::backends::permissions::{Grants, Permission};
use tracing::{info, warn};

impl AppModel {
    pub(crate) fn has_camera_and_storage_permission(&self) -> bool {
        self.permissions.has(Permission::Camera) && self.permissions.has(Permission::Storage)
    }

    /// Set up the camera, or ask for whatever access is missing
    pub(crate) fn try_init_camera(&mut self) -> Task {
        if self.has_camera_and_storage_permission() {
            let task = self.initialize_camera();
            self.handle_intent();
            return task;
        }

        let missing: Vec<Permission> = [Permission::Camera, Permission::Storage]
            .into_iter()
            .filter(|permission| !self.permissions.has(*permission))
            .collect();
        info!(?missing, "Requesting camera permissions");
        self.request_permissions(PermissionRequest::CameraStorage, missing)
    }

    pub(crate) fn request_permissions(
        &mut self,
        request: PermissionRequest,
        permissions: Vec<Permission>,
    ) -> Task {
        Task::perform(self.permissions.request(permissions), move |grants| {
            Message::PermissionsResult { request, grants }
        })
    }

    fn initialize_camera(&mut self) -> Task {
        self.facing = self.config.last_used_camera;
        self.controls.camera_toggle_icon = CameraToggleIcon::for_facing(self.facing);
        self.mode = CameraMode::Photo;
        self.flash_state = self.config.flashlight_state;
        self.is_initialized = true;
        self.setup_preview_image(CameraMode::Photo)
    }

    /// Apply the capture intent to the controls and preview
    fn handle_intent(&mut self) {
        match &self.intent {
            CaptureIntent::None => {}
            CaptureIntent::Image { output } => {
                if let Some(output) = output.clone() {
                    self.preview.set_target_path(output);
                }
                self.hide_toggle_mode_about();
            }
            CaptureIntent::Video => {
                self.hide_toggle_mode_about();
                self.controls.shutter_icon = ShutterIcon::VideoRec;
            }
        }
    }

    fn hide_toggle_mode_about(&mut self) {
        self.controls.mode_toggle_visible = false;
        self.controls.settings_visible = false;
    }

    pub(crate) fn handle_permissions_result(
        &mut self,
        request: PermissionRequest,
        grants: Grants,
    ) -> Task {
        self.is_asking_permissions = false;
        let all_granted = !grants.is_empty() && grants.iter().all(|(_, granted)| *granted);
        info!(?request, ?grants, "Permissions answered");

        match request {
            PermissionRequest::CameraStorage => {
                if !all_granted {
                    warn!("Camera or storage access denied");
                    return Task::batch([
                        self.notice(Notice::NoPermissions),
                        self.finish(CaptureResult::Cancelled),
                    ]);
                }
                let init = self.initialize_camera();
                self.handle_intent();
                // A resume that happened while the request was pending did nothing
                let resume = if self.is_resumed {
                    self.resume_camera()
                } else {
                    Task::none()
                };
                Task::batch([init, resume])
            }
            PermissionRequest::RecordAudio => {
                if all_granted {
                    let (task, toggled) = self.toggle_photo_video();
                    if toggled {
                        return Task::batch([task, self.check_buttons()]);
                    }
                    return task;
                }
                let notice = self.notice(Notice::NoAudioPermissions);
                if self.intent.is_video() {
                    Task::batch([notice, self.finish(CaptureResult::Cancelled)])
                } else {
                    notice
                }
            }
        }
    }
}
