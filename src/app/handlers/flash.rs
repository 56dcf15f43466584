// SPDX-License-Identifier: GPL-3.0-only

//! Flash cycle
//!
//! Every path that applies a flash state goes through [`AppModel::check_flash`]
//! or one of the setters, which keep the state legal for the current mode and
//! persist it.

use crate::app::state::{AppModel, Control};
use crate::app::task::Task;
use crate::flash::FlashState;
use tracing::{debug, info};

impl AppModel {
    pub(crate) fn handle_toggle_flash(&mut self) -> Task {
        if !self.controls.is_clickable(Control::Flash) {
            return Task::none();
        }
        if let Some(task) = self.require_camera() {
            return task;
        }
        self.flash_state = self.flash_state.next(self.mode);
        self.check_flash();
        info!(state = ?self.flash_state, mode = ?self.mode, "Flash toggled");
        Task::none()
    }

    /// Push the current flash state to the preview
    pub(crate) fn check_flash(&mut self) {
        match self.flash_state.legal_for(self.mode) {
            FlashState::On => self.enable_flash(),
            FlashState::Auto => self.auto_flash(),
            FlashState::Off => self.disable_flash(),
        }
    }

    pub(crate) fn disable_flash(&mut self) {
        self.preview.disable_flash();
        self.set_flash_state(FlashState::Off);
    }

    fn enable_flash(&mut self) {
        self.preview.enable_flash();
        self.set_flash_state(FlashState::On);
    }

    fn auto_flash(&mut self) {
        self.preview.auto_flash();
        self.set_flash_state(FlashState::Auto);
    }

    fn set_flash_state(&mut self, state: FlashState) {
        self.controls.flash_icon = state;
        self.flash_state = state;
        if self.config.flashlight_state != state {
            self.config.flashlight_state = state;
            self.save_config();
        }
    }

    pub(crate) fn handle_flash_available(&mut self, available: bool) -> Task {
        debug!(available, "Flash availability changed");
        self.controls.flash_visible = available;
        if !available {
            self.disable_flash();
        }
        Task::none()
    }
}
