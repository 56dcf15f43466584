// SPDX-License-Identifier: GPL-3.0-only

//! Device orientation buckets derived from the accelerometer

use crate::constants::orientation::LANDSCAPE_THRESHOLD;

/// Coarse device orientation used to rotate the on-screen controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    /// Rotated so the x axis reads strongly positive
    LandscapeLeft,
    /// Rotated so the x axis reads strongly negative
    LandscapeRight,
}

impl Orientation {
    /// Classify a single accelerometer x-axis sample (m/s²)
    pub fn from_accel_x(x: f32) -> Self {
        if x < LANDSCAPE_THRESHOLD && x > -LANDSCAPE_THRESHOLD {
            Orientation::Portrait
        } else if x > 0.0 {
            Orientation::LandscapeLeft
        } else {
            Orientation::LandscapeRight
        }
    }

    /// Rotation applied to the controls, in degrees
    pub fn degrees(self) -> i32 {
        match self {
            Orientation::Portrait => 0,
            Orientation::LandscapeLeft => 90,
            Orientation::LandscapeRight => -90,
        }
    }
}
