// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle handlers
//!
//! Create/resume/pause/destroy and the hardware camera key.

use crate::app::state::{AppModel, CameraMode, HostRequest, Key, Notice, ShutterIcon};
use crate::app::task::Task;
use crate::constants::{self, app_info};
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_create(&mut self) -> Task {
        info!(intent = ?self.intent, "Camera screen created");
        if let Err(e) = self.media_store.prepare() {
            warn!(error = %e, "Media directories not ready");
        }

        let init = self.try_init_camera();
        let whats_new = self.check_whats_new();
        Task::batch([init, whats_new])
    }

    /// Show notes of releases newer than the last one the user saw
    ///
    /// A first run just records the current release.
    fn check_whats_new(&mut self) -> Task {
        let latest = app_info::latest_release();
        if self.config.last_seen_release >= latest {
            return Task::none();
        }

        let notes: Vec<String> = if self.config.is_first_run {
            Vec::new()
        } else {
            constants::RELEASES
                .iter()
                .filter(|release| release.id > self.config.last_seen_release)
                .map(|release| release.notes.to_string())
                .collect()
        };

        self.config.last_seen_release = latest;
        self.save_config();

        if notes.is_empty() {
            Task::none()
        } else {
            self.notice(Notice::WhatsNew(notes))
        }
    }

    pub(crate) fn handle_resume(&mut self) -> Task {
        self.is_resumed = true;
        let keep_on = Task::host(HostRequest::KeepScreenOn(true));

        if !self.is_initialized || !self.has_camera_and_storage_permission() {
            debug!("Resumed without camera access");
            return keep_on;
        }

        Task::batch([self.resume_camera(), keep_on])
    }

    /// Reacquire the camera and refresh everything shown around it
    pub(crate) fn resume_camera(&mut self) -> Task {
        let mut tasks = vec![
            self.resume_camera_items(),
            self.setup_preview_image(self.mode),
            self.schedule_fade_out(),
        ];
        self.controls.focus_color = self.config.primary_color.clone();

        if self.intent.is_video() && self.mode == CameraMode::Photo {
            let (task, toggled) = self.toggle_photo_video();
            tasks.push(task);
            if toggled {
                tasks.push(self.check_buttons());
            }
        }
        Task::batch(tasks)
    }

    fn resume_camera_items(&mut self) -> Task {
        self.show_toggle_camera_if_needed();
        match self.preview.set_camera(self.facing) {
            Ok(()) => {
                self.is_camera_available = true;
                self.check_flash();
                self.sensor_registered = true;
                if self.mode == CameraMode::Video {
                    return self.init_video_buttons();
                }
                Task::none()
            }
            Err(e) => {
                warn!(facing = ?self.facing, error = %e, "Failed to open camera on resume");
                self.is_camera_available = false;
                self.notice(Notice::CameraSwitchError)
            }
        }
    }

    pub(crate) fn handle_pause(&mut self) -> Task {
        self.is_resumed = false;
        let keep_off = Task::host(HostRequest::KeepScreenOn(false));

        if !self.has_camera_and_storage_permission() || self.is_asking_permissions {
            return keep_off;
        }

        // Cancels a pending fade-out
        self.timers.fade += 1;
        self.hide_timer();
        if self.mode == CameraMode::Video {
            self.controls.shutter_icon = ShutterIcon::VideoRec;
        }
        self.preview.release_camera();
        self.sensor_registered = false;
        debug!("Camera released on pause");
        keep_off
    }

    pub(crate) fn handle_destroy(&mut self) -> Task {
        self.config.is_first_run = false;
        self.save_config();
        self.preview.release_camera();
        self.sensor_registered = false;
        info!("Camera screen destroyed");
        Task::none()
    }

    /// The camera key fires once per press, repeats are dropped until key-up
    pub(crate) fn handle_key_down(&mut self, key: Key) -> Task {
        if key != Key::Camera || self.hardware_shutter_handled {
            return Task::none();
        }
        self.hardware_shutter_handled = true;
        self.handle_shutter_pressed()
    }

    pub(crate) fn handle_key_up(&mut self, key: Key) -> Task {
        if key == Key::Camera {
            self.hardware_shutter_handled = false;
        }
        Task::none()
    }
}
