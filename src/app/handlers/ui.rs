// SPDX-License-Identifier: GPL-3.0-only

//! UI handlers
//!
//! Fading of the secondary controls, settings, notices and config writes.

use crate::app::state::{AppModel, CaptureResult, HostRequest, Message, Notice};
use crate::app::task::Task;
use crate::constants::{timing, ui};
use tracing::{error, info};

impl AppModel {
    pub(crate) fn notice(&self, notice: Notice) -> Task {
        info!(notice = %notice, "Showing notice");
        Task::host(HostRequest::ShowNotice(notice))
    }

    /// Hand the result to the host; later input is ignored
    pub(crate) fn finish(&mut self, result: CaptureResult) -> Task {
        info!(?result, "Finishing");
        self.finished = Some(result.clone());
        Task::host(HostRequest::Finish(result))
    }

    pub(crate) fn save_config(&self) {
        if let Some(handler) = &self.config_handler {
            if let Err(err) = handler.write_entry(&self.config) {
                error!(?err, "Failed to save config");
            }
        }
    }

    /// Fade the secondary controls after the idle delay, replacing any pending fade
    pub(crate) fn schedule_fade_out(&mut self) -> Task {
        self.timers.fade += 1;
        Task::delay(timing::FADE_DELAY, Message::FadeOutControls(self.timers.fade))
    }

    pub(crate) fn handle_fade_out_controls(&mut self, generation: u64) -> Task {
        if generation == self.timers.fade {
            self.controls
                .set_secondary_alpha(ui::SETTINGS_FADED_ALPHA, ui::HIDDEN);
        }
        Task::none()
    }

    fn fade_in_buttons(&mut self) -> Task {
        self.controls.set_secondary_alpha(ui::OPAQUE, ui::OPAQUE);
        self.schedule_fade_out()
    }

    /// Settings open only when fully visible; a faded tap brings the controls back
    pub(crate) fn handle_open_settings(&mut self) -> Task {
        if !self.controls.settings_visible {
            return Task::none();
        }
        if self.controls.settings_alpha == ui::OPAQUE {
            Task::host(HostRequest::OpenSettings)
        } else {
            self.fade_in_buttons()
        }
    }
}
