// SPDX-License-Identifier: GPL-3.0-only

//! Orientation reactor

use crate::app::orientation::Orientation;
use crate::app::state::AppModel;
use crate::app::task::Task;
use tracing::debug;

impl AppModel {
    /// Rotate the controls when the orientation bucket changes
    ///
    /// Samples are ignored while the sensor is unregistered (paused).
    pub(crate) fn handle_accelerometer_sample(&mut self, x: f32) -> Task {
        if !self.sensor_registered {
            return Task::none();
        }

        let orientation = Orientation::from_accel_x(x);
        if orientation != self.last_handled_orientation {
            debug!(?orientation, x, "Orientation changed");
            self.preview.device_orientation_changed(orientation);
            self.controls.rotation = orientation.degrees();
            self.last_handled_orientation = orientation;
        }
        Task::none()
    }
}
